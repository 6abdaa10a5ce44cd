//! Transport-framing (MLLP) wrapper handling.

use crate::error::{BarError, Result};

/// Leading block-start control byte.
const BLOCK_START: char = '\u{0b}';
/// Trailing block-end control byte followed by the terminator.
const BLOCK_END: &str = "\u{1c}\r";

/// Strip the transport-framing wrapper from a raw message, if present.
///
/// A framed message carries a leading block-start byte and a trailing
/// block-end byte plus terminator. Both must be present or both absent;
/// finding only one of the two is a malformed header.
pub fn strip_framing(raw: &str) -> Result<&str> {
    let has_start = raw.starts_with(BLOCK_START);
    let has_end = raw.ends_with(BLOCK_END);
    match (has_start, has_end) {
        (true, true) => Ok(&raw[BLOCK_START.len_utf8()..raw.len() - BLOCK_END.len()]),
        (false, false) => Ok(raw),
        (true, false) => Err(BarError::header(
            "block-start byte present without trailing block-end",
        )),
        (false, true) => Err(BarError::header(
            "trailing block-end bytes present without block-start",
        )),
    }
}
