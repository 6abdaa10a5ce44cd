//! Reserved-character escape sequences.
//!
//! A sequence is `escape-char`, a body, `escape-char`. Single-letter bodies
//! name a separator (`F` field, `S` component, `R` repetition, `T`
//! subcomponent, `E` the escape character itself); `X`/`Z` bodies carry a
//! hex-encoded byte run. Every other body (`H`, `N`, `.br`, `.sp 2`, ...) is
//! a formatting instruction that has no bar-text equivalent and is carried
//! through as a structured [`TextPart::Formatting`] part so the tagged side
//! can render it as an `<escape V="..."/>` element.

use thiserror::Error;

use crate::separators::SeparatorSet;

/// Errors raised while decoding escape sequences.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EscapeError {
    /// An escape character opened a sequence that never closed.
    #[error("unterminated escape sequence at offset {position}")]
    UnterminatedSequence { position: usize },

    /// An `X`/`Z` body held an odd digit count, a non-hex digit, or bytes
    /// that do not form valid UTF-8.
    #[error("invalid hexadecimal escape body {body:?}")]
    InvalidHex { body: String },
}

/// One decoded piece of subcomponent text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPart {
    /// Literal text with all separator and hex escapes resolved.
    Text(String),
    /// A formatting escape body, verbatim and without its delimiters.
    Formatting(String),
}

/// Decode raw bar-grammar subcomponent text into its parts.
pub fn decode_parts(raw: &str, seps: &SeparatorSet) -> Result<Vec<TextPart>, EscapeError> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = raw.char_indices();
    while let Some((offset, c)) = chars.next() {
        if c != seps.escape {
            text.push(c);
            continue;
        }
        let mut body = String::new();
        let mut closed = false;
        for (_, b) in chars.by_ref() {
            if b == seps.escape {
                closed = true;
                break;
            }
            body.push(b);
        }
        if !closed {
            return Err(EscapeError::UnterminatedSequence { position: offset });
        }
        match body.as_str() {
            "F" => text.push(seps.field),
            "S" => text.push(seps.component),
            "R" => text.push(seps.repetition),
            "T" => text.push(seps.subcomponent),
            "E" => text.push(seps.escape),
            _ if body.starts_with('X') || body.starts_with('Z') => {
                text.push_str(&decode_hex(&body)?);
            }
            _ => {
                if !text.is_empty() {
                    parts.push(TextPart::Text(std::mem::take(&mut text)));
                }
                parts.push(TextPart::Formatting(body));
            }
        }
    }
    if !text.is_empty() || parts.is_empty() {
        parts.push(TextPart::Text(text));
    }
    Ok(parts)
}

/// Decode raw subcomponent text to a plain string. Formatting escapes, which
/// have no literal form, are re-rendered verbatim with their delimiters.
pub fn decode(raw: &str, seps: &SeparatorSet) -> Result<String, EscapeError> {
    let mut out = String::new();
    for part in decode_parts(raw, seps)? {
        match part {
            TextPart::Text(text) => out.push_str(&text),
            TextPart::Formatting(body) => {
                out.push(seps.escape);
                out.push_str(&body);
                out.push(seps.escape);
            }
        }
    }
    Ok(out)
}

/// Encode literal text for emission into bar format.
///
/// Every occurrence of a separator or the escape character is replaced by
/// its escape sequence; leaving one unescaped would corrupt structure on the
/// next parse, so this step is mandatory for all emitted leaf text. Control
/// characters are emitted in the hexadecimal form.
pub fn encode(text: &str, seps: &SeparatorSet) -> String {
    let mut out = String::new();
    let e = seps.escape;
    for c in text.chars() {
        if c == seps.field {
            push_sequence(&mut out, e, "F");
        } else if c == seps.component {
            push_sequence(&mut out, e, "S");
        } else if c == seps.repetition {
            push_sequence(&mut out, e, "R");
        } else if c == seps.subcomponent {
            push_sequence(&mut out, e, "T");
        } else if c == e {
            push_sequence(&mut out, e, "E");
        } else if c.is_control() {
            let mut buf = [0u8; 4];
            let body = format!("X{}", hex::encode_upper(c.encode_utf8(&mut buf).as_bytes()));
            push_sequence(&mut out, e, &body);
        } else {
            out.push(c);
        }
    }
    out
}

fn push_sequence(out: &mut String, escape: char, body: &str) {
    out.push(escape);
    out.push_str(body);
    out.push(escape);
}

fn decode_hex(body: &str) -> Result<String, EscapeError> {
    let digits = &body[1..];
    let invalid = || EscapeError::InvalidHex {
        body: body.to_string(),
    };
    if digits.is_empty() {
        return Err(invalid());
    }
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    String::from_utf8(bytes).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEPS: SeparatorSet = SeparatorSet::DEFAULT;

    #[test]
    fn decodes_separator_kinds() {
        let decoded = decode("a\\F\\b\\S\\c\\R\\d\\T\\e\\E\\f", &SEPS).expect("decode");
        assert_eq!(decoded, "a|b^c~d&e\\f");
    }

    #[test]
    fn decodes_hex_form() {
        assert_eq!(decode("\\X0D0A\\", &SEPS).expect("decode"), "\r\n");
        assert_eq!(decode("\\Z41\\", &SEPS).expect("decode"), "A");
    }

    #[test]
    fn unterminated_sequence_is_an_error() {
        let err = decode("ab\\F", &SEPS).unwrap_err();
        assert_eq!(err, EscapeError::UnterminatedSequence { position: 2 });
    }

    #[test]
    fn invalid_hex_is_an_error() {
        assert!(matches!(
            decode("\\XQQ\\", &SEPS),
            Err(EscapeError::InvalidHex { .. })
        ));
        assert!(matches!(
            decode("\\X0\\", &SEPS),
            Err(EscapeError::InvalidHex { .. })
        ));
    }

    #[test]
    fn formatting_escapes_become_parts() {
        let parts = decode_parts("line one\\.br\\line two", &SEPS).expect("decode");
        assert_eq!(
            parts,
            vec![
                TextPart::Text("line one".to_string()),
                TextPart::Formatting(".br".to_string()),
                TextPart::Text("line two".to_string()),
            ]
        );
    }

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(encode("a|b", &SEPS), "a\\F\\b");
        assert_eq!(encode("x^y~z", &SEPS), "x\\S\\y\\R\\z");
        assert_eq!(encode("p\\q&r", &SEPS), "p\\E\\q\\T\\r");
        assert_eq!(encode("\r", &SEPS), "\\X0D\\");
    }

    #[test]
    fn encode_respects_the_message_separator_set() {
        let seps = SeparatorSet::new('!', '@', '#', '$', '%').expect("set");
        assert_eq!(encode("a!b", &seps), "a$F$b");
        // The conventional characters are ordinary text under this set.
        assert_eq!(encode("a|b^c", &seps), "a|b^c");
    }

    #[test]
    fn empty_input_decodes_to_one_empty_part() {
        assert_eq!(
            decode_parts("", &SEPS).expect("decode"),
            vec![TextPart::Text(String::new())]
        );
    }
}
