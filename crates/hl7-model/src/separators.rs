//! Message-scoped separator characters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling a [`SeparatorSet`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeparatorError {
    /// The same character was declared for two separator roles.
    #[error("separator character {0:?} declared twice")]
    Duplicate(char),

    /// The encoding-character run held fewer than four characters.
    #[error("expected 4 encoding characters, found {found}")]
    IncompleteEncoding { found: usize },
}

/// The five separator characters declared by one message's header segment.
///
/// Valid only for the lifetime of that message. All five characters are
/// guaranteed distinct by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparatorSet {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl SeparatorSet {
    /// The conventional `|^~\&` set. Used by tests and examples only; real
    /// messages always supply their own.
    pub const DEFAULT: SeparatorSet = SeparatorSet {
        field: '|',
        component: '^',
        repetition: '~',
        escape: '\\',
        subcomponent: '&',
    };

    /// Build a set from the five declared characters, rejecting duplicates.
    pub fn new(
        field: char,
        component: char,
        repetition: char,
        escape: char,
        subcomponent: char,
    ) -> Result<Self, SeparatorError> {
        let chars = [field, component, repetition, escape, subcomponent];
        for (i, a) in chars.iter().enumerate() {
            if chars[i + 1..].contains(a) {
                return Err(SeparatorError::Duplicate(*a));
            }
        }
        Ok(SeparatorSet {
            field,
            component,
            repetition,
            escape,
            subcomponent,
        })
    }

    /// Build a set from the field separator plus the four encoding characters
    /// in declared order: component, repetition, escape, subcomponent.
    pub fn from_header_chars(field: char, encoding: &str) -> Result<Self, SeparatorError> {
        let mut chars = encoding.chars();
        let (Some(component), Some(repetition), Some(escape), Some(subcomponent)) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(SeparatorError::IncompleteEncoding {
                found: encoding.chars().count(),
            });
        };
        SeparatorSet::new(field, component, repetition, escape, subcomponent)
    }

    /// The four encoding characters as they appear in the header's second
    /// field.
    pub fn encoding_chars(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    /// True when `c` is one of the four structural separators (the escape
    /// character is not a separator).
    pub fn is_separator(&self, c: char) -> bool {
        c == self.field || c == self.component || c == self.repetition || c == self.subcomponent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_matches_convention() {
        let set = SeparatorSet::from_header_chars('|', "^~\\&").expect("conventional set");
        assert_eq!(set, SeparatorSet::DEFAULT);
        assert_eq!(set.encoding_chars(), "^~\\&");
    }

    #[test]
    fn duplicate_characters_rejected() {
        let err = SeparatorSet::new('|', '^', '^', '\\', '&').unwrap_err();
        assert_eq!(err, SeparatorError::Duplicate('^'));
    }

    #[test]
    fn short_encoding_rejected() {
        let err = SeparatorSet::from_header_chars('|', "^~\\").unwrap_err();
        assert_eq!(err, SeparatorError::IncompleteEncoding { found: 3 });
    }

    #[test]
    fn separator_membership() {
        let set = SeparatorSet::DEFAULT;
        assert!(set.is_separator('|'));
        assert!(set.is_separator('&'));
        assert!(!set.is_separator('\\'));
        assert!(!set.is_separator('a'));
    }
}
