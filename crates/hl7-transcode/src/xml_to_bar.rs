//! The structural tagged-to-bar conversion path.
//!
//! No schema is consulted. Nesting depth and the dotted tag convention
//! alone decide what each element is: a three-character tag under the root
//! is a segment, a longer tag is a group to flatten, and the number after
//! an element's final dot is its field/component/subcomponent position.
//! Same-position siblings join with the repetition separator. Whatever
//! structure the document declares is serialized faithfully, valid or not.

use hl7_model::{HEADER_CODE, SeparatorSet, escape};
use tracing::debug;

use crate::dom::{Content, Element, parse_document};
use crate::error::{Result, TranscodeError};

/// Convert one tagged-grammar document to bar-format text.
pub fn xml_to_bar(xml: &str) -> Result<String> {
    let root = parse_document(xml)?;
    let mut segments = Vec::new();
    collect_segments(&root, &mut segments);

    let Some(header) = segments.first() else {
        return Err(TranscodeError::document("document holds no segments"));
    };
    if header.tag != HEADER_CODE {
        return Err(TranscodeError::document(format!(
            "first segment element is {:?}, expected {HEADER_CODE:?}",
            header.tag
        )));
    }
    let seps = separators_from_header(header)?;
    debug!(segments = segments.len(), "serializing bar message");

    let mut out = String::new();
    for segment in segments {
        out.push_str(&emit_segment(segment, &seps)?);
        out.push('\r');
    }
    Ok(out)
}

/// Depth-first flattening of the root's children: segments in document
/// order, group wrappers dissolved.
fn collect_segments<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in element.children() {
        if child.tag.len() == 3 {
            out.push(child);
        } else {
            collect_segments(child, out);
        }
    }
}

/// Reconstruct the separator set from the header element's own declared
/// field content rather than deriving it heuristically.
fn separators_from_header(header: &Element) -> Result<SeparatorSet> {
    let field_of = |tag: &str| header.children().find(|child| child.tag == tag);
    let field_sep_text = field_of("MSH.1")
        .ok_or_else(|| TranscodeError::document("header lacks the field-separator field (MSH.1)"))?
        .text();
    let field = field_sep_text
        .chars()
        .next()
        .ok_or_else(|| TranscodeError::document("field-separator field (MSH.1) is empty"))?;
    let encoding = field_of("MSH.2")
        .ok_or_else(|| {
            TranscodeError::document("header lacks the encoding-characters field (MSH.2)")
        })?
        .text();
    SeparatorSet::from_header_chars(field, &encoding)
        .map_err(|err| TranscodeError::document(err.to_string()))
}

fn emit_segment(segment: &Element, seps: &SeparatorSet) -> Result<String> {
    let mut out = segment.tag.clone();
    let is_header = segment.tag == HEADER_CODE;
    // For the header, field 1 is the separator character itself; the first
    // field separator we write stands in for it.
    let mut last_field = if is_header { 1 } else { 0 };
    for child in segment.children() {
        let index = trailing_index(child)?;
        if is_header && index == 1 {
            continue;
        }
        if index == last_field {
            out.push(seps.repetition);
        } else {
            while last_field < index {
                out.push(seps.field);
                last_field += 1;
            }
        }
        if is_header && index == 2 {
            // Encoding characters are literal, never escaped.
            out.push_str(&child.text());
            continue;
        }
        out.push_str(&emit_value(child, seps, Level::Component)?);
    }
    Ok(out)
}

#[derive(Clone, Copy)]
enum Level {
    Component,
    Subcomponent,
}

fn emit_value(element: &Element, seps: &SeparatorSet, level: Level) -> Result<String> {
    if element.is_leaf() {
        return emit_leaf(element, seps);
    }
    let separator = match level {
        Level::Component => seps.component,
        Level::Subcomponent => seps.subcomponent,
    };
    let mut out = String::new();
    let mut last = 1;
    let mut first = true;
    for child in element.children() {
        let index = trailing_index(child)?;
        if !first && index == last {
            out.push(seps.repetition);
        } else {
            while last < index {
                out.push(separator);
                last += 1;
            }
        }
        first = false;
        let value = match level {
            Level::Component => emit_value(child, seps, Level::Subcomponent)?,
            Level::Subcomponent => emit_leaf(child, seps)?,
        };
        out.push_str(&value);
    }
    Ok(out)
}

/// Serialize leaf content: literal text escape-encoded against the message
/// separator set, `<escape V="..."/>` children re-rendered as delimited
/// escape bodies.
fn emit_leaf(element: &Element, seps: &SeparatorSet) -> Result<String> {
    let mut out = String::new();
    for content in &element.content {
        match content {
            Content::Text(text) => out.push_str(&escape::encode(text, seps)),
            Content::Child(child) if child.tag == "escape" => {
                let body = child.attr("V").ok_or_else(|| {
                    TranscodeError::document(format!(
                        "escape element in {} lacks its V attribute",
                        element.tag
                    ))
                })?;
                out.push(seps.escape);
                out.push_str(body);
                out.push(seps.escape);
            }
            Content::Child(child) => {
                return Err(TranscodeError::document(format!(
                    "unexpected element {} inside leaf {}",
                    child.tag, element.tag
                )));
            }
        }
    }
    Ok(out)
}

fn trailing_index(element: &Element) -> Result<usize> {
    element
        .tag
        .rsplit('.')
        .next()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            TranscodeError::document(format!(
                "element {} carries no positional index",
                element.tag
            ))
        })
}
