//! Separator resolution from the header segment.

use hl7_model::{HEADER_CODE, SeparatorSet};

use crate::error::{BarError, Result};

/// Resolve the five separator characters from the raw text of the first
/// segment.
///
/// The character immediately after the header code is the field separator;
/// the next four, in fixed order, are the component, repetition, escape and
/// subcomponent separators.
pub fn resolve_separators(first_segment: &str) -> Result<SeparatorSet> {
    let Some(rest) = first_segment.strip_prefix(HEADER_CODE) else {
        return Err(BarError::header(format!(
            "first segment does not begin with {HEADER_CODE}"
        )));
    };
    let mut chars = rest.chars();
    let (Some(field), Some(component), Some(repetition), Some(escape), Some(subcomponent)) = (
        chars.next(),
        chars.next(),
        chars.next(),
        chars.next(),
        chars.next(),
    ) else {
        return Err(BarError::header(
            "fewer than five separator characters follow the header code",
        ));
    };
    SeparatorSet::new(field, component, repetition, escape, subcomponent)
        .map_err(|err| BarError::header(err.to_string()))
}
