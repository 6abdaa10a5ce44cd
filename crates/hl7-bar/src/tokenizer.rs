//! Escape-aware tokenization of bar-format text into the message model.

use hl7_model::{Component, Field, HEADER_CODE, Message, Repetition, Segment, SeparatorSet};
use tracing::debug;

use crate::error::{BarError, Result};
use crate::framing::strip_framing;
use crate::separators::resolve_separators;

/// Split `text` on `sep`, ignoring separators that fall inside an open
/// escape sequence.
pub fn split_escaped<'a>(text: &'a str, sep: char, escape: char) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_escape = false;
    for (offset, c) in text.char_indices() {
        if c == escape {
            in_escape = !in_escape;
        } else if c == sep && !in_escape {
            parts.push(&text[start..offset]);
            start = offset + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse a raw bar-format message into the message model plus the separator
/// set it declared.
///
/// Accepts `\r`, `\n` or `\r\n` segment terminators and an optional
/// transport-framing wrapper. Trailing fields a producer omitted are simply
/// absent from the model; [`Segment::field`] reads them as empty.
pub fn parse_message(raw: &str) -> Result<(Message, SeparatorSet)> {
    let unframed = strip_framing(raw)?;
    let normalized = unframed.replace("\r\n", "\r").replace('\n', "\r");
    let lines: Vec<&str> = normalized
        .split('\r')
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(BarError::message("message contains no segments"));
    }

    let seps = resolve_separators(lines[0])?;
    debug!(segments = lines.len(), "tokenizing bar message");

    let mut segments = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let segment = if index == 0 {
            parse_header_segment(line, &seps)
        } else {
            parse_segment(line, &seps)
        };
        segments.push(segment);
    }

    let header = &segments[0];
    if header.code != HEADER_CODE {
        return Err(BarError::message(format!(
            "first segment code is {:?}, expected {HEADER_CODE:?}",
            header.code
        )));
    }
    // The structure-type field lives in MSH-9 and the version in MSH-12; a
    // header shorter than that cannot drive any conversion.
    if header.fields.len() < 12 {
        return Err(BarError::message(
            "header segment too short: no version field",
        ));
    }

    Ok((Message { segments }, seps))
}

/// Parse the header segment. Its first two fields are special: field 1 is
/// the field separator itself and field 2 the encoding characters, and
/// neither may go through separator or escape processing.
fn parse_header_segment(line: &str, seps: &SeparatorSet) -> Segment {
    // HEADER_CODE + field sep were validated by the separator resolver.
    let prefix_len = HEADER_CODE.len() + seps.field.len_utf8();
    let after_code = &line[prefix_len..];
    // Field 2 runs to the next field separator. The four standard encoding
    // characters may be followed by extras (v2.7 adds a truncation
    // character); they stay in the field's atomic text.
    let (encoding, rest) = match after_code.find(seps.field) {
        Some(idx) => after_code.split_at(idx),
        None => (after_code, ""),
    };

    let mut fields = vec![
        Field::from_text(seps.field.to_string()),
        Field::from_text(encoding),
    ];
    if let Some(tail) = rest.strip_prefix(seps.field) {
        for raw_field in split_escaped(tail, seps.field, seps.escape) {
            fields.push(parse_field(raw_field, seps));
        }
    }
    Segment {
        code: HEADER_CODE.to_string(),
        fields,
    }
}

fn parse_segment(line: &str, seps: &SeparatorSet) -> Segment {
    let mut parts = split_escaped(line, seps.field, seps.escape).into_iter();
    let code = parts.next().unwrap_or_default().to_string();
    let fields = parts.map(|raw| parse_field(raw, seps)).collect();
    Segment { code, fields }
}

fn parse_field(raw: &str, seps: &SeparatorSet) -> Field {
    let repetitions = split_escaped(raw, seps.repetition, seps.escape)
        .into_iter()
        .map(|rep| Repetition {
            components: split_escaped(rep, seps.component, seps.escape)
                .into_iter()
                .map(|comp| Component {
                    subcomponents: split_escaped(comp, seps.subcomponent, seps.escape)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Field { repetitions }
}
