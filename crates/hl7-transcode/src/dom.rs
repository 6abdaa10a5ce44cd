//! Minimal XML document tree used by both conversion paths.
//!
//! Leaf elements hold mixed content: literal text interleaved with empty
//! `<escape V="..."/>` children carrying formatting escapes. Reading and
//! writing go through quick-xml events; pretty-printing indents purely
//! structural elements and keeps mixed content inline so leaf text survives
//! a round trip.

use quick_xml::Reader;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, TranscodeError};

/// One element of a tagged-grammar document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub content: Vec<Content>,
}

/// Element content in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Child(Element),
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn push_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((key.into(), value.into()));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.content.push(Content::Text(text.into()));
    }

    pub fn push_child(&mut self, child: Element) {
        self.content.push(Content::Child(child));
    }

    /// Child elements, ignoring interleaved text.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(|content| match content {
            Content::Child(child) => Some(child),
            Content::Text(_) => None,
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated literal text, without child elements.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for content in &self.content {
            if let Content::Text(text) = content {
                out.push_str(text);
            }
        }
        out
    }

    /// True when this element carries no child elements other than
    /// `<escape/>` markers, i.e. it is a text leaf.
    pub fn is_leaf(&self) -> bool {
        self.children().all(|child| child.tag == "escape")
    }
}

/// Parse a tagged-grammar document into an element tree.
///
/// Whitespace-only text between child elements is indentation and is
/// discarded; leaf text is kept verbatim. The declaration, comments and
/// processing instructions are skipped.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(unescape_text(e.as_ref())?);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(resolve_reference(e.as_ref())?);
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(String::from_utf8_lossy(e.as_ref()).into_owned());
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TranscodeError::document("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(TranscodeError::document("unclosed element at end of input"));
    }
    let mut root = root.ok_or_else(|| TranscodeError::document("no root element"))?;
    prune_indentation(&mut root);
    Ok(root)
}

/// Drop whitespace-only text from elements that hold child elements; there
/// it can only be indentation. Leaf text is kept verbatim, so whitespace
/// split off by an entity reference survives.
fn prune_indentation(element: &mut Element) {
    if !element.is_leaf() {
        element.content.retain(|content| match content {
            Content::Text(text) => !text.chars().all(char::is_whitespace),
            Content::Child(_) => true,
        });
    }
    for content in &mut element.content {
        if let Content::Child(child) = content {
            prune_indentation(child);
        }
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(TranscodeError::document("more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

fn element_from(e: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| TranscodeError::document(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = unescape_text(attr.value.as_ref())?;
        element.push_attr(key, value);
    }
    Ok(element)
}

fn unescape_text(raw: &[u8]) -> Result<String> {
    let raw = String::from_utf8_lossy(raw);
    let unescaped = quick_xml::escape::unescape(&raw)
        .map_err(|err| TranscodeError::document(format!("bad character reference: {err}")))?;
    Ok(unescaped.into_owned())
}

/// Resolve one general entity reference (`&name;`, `&#NN;`, `&#xHH;`),
/// handed over by the reader as the text between `&` and `;`.
fn resolve_reference(raw: &[u8]) -> Result<String> {
    let name = String::from_utf8_lossy(raw);
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        return value
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| {
                TranscodeError::document(format!("bad character reference &{name};"))
            });
    }
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(ToString::to_string)
        .ok_or_else(|| TranscodeError::document(format!("unresolvable entity reference &{name};")))
}

/// Serialize an element tree to an indented document string.
pub fn serialize_document(root: &Element) -> Result<String> {
    let mut writer = quick_xml::Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    write_element(&mut writer, root, 0)?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_element(
    writer: &mut quick_xml::Writer<Vec<u8>>,
    element: &Element,
    depth: usize,
) -> Result<()> {
    let mut start = BytesStart::new(&element.tag);
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.content.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    let structural = element
        .content
        .iter()
        .all(|content| matches!(content, Content::Child(_)))
        && !element.is_leaf();
    writer.write_event(Event::Start(start))?;
    if structural {
        for content in &element.content {
            if let Content::Child(child) = content {
                writer.write_event(Event::Text(BytesText::new(&indent(depth + 1))))?;
                write_element(writer, child, depth + 1)?;
            }
        }
        writer.write_event(Event::Text(BytesText::new(&indent(depth))))?;
    } else {
        for content in &element.content {
            match content {
                Content::Text(text) => {
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                }
                Content::Child(child) => write_element(writer, child, depth)?,
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(&element.tag)))?;
    Ok(())
}

fn indent(depth: usize) -> String {
    let mut out = String::with_capacity(1 + depth * 2);
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
    out
}
