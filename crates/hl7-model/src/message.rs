//! The transient per-conversion message tree.
//!
//! Fields are 1-based: `Segment::field(1)` is the first field after the
//! segment code. A field absent from the wire (a producer may omit trailing
//! empties) simply reads as empty. For the MSH header, field 1 holds the
//! field separator itself and field 2 the four encoding characters, both as
//! atomic text.

use serde::{Deserialize, Serialize};

/// An ordered sequence of segments. The first segment is always the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub segments: Vec<Segment>,
}

impl Message {
    /// The header segment. Parsers guarantee at least one segment, so this
    /// only returns `None` for a hand-built empty message.
    pub fn header(&self) -> Option<&Segment> {
        self.segments.first()
    }
}

/// A segment: a short code plus its 1-based fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub code: String,
    pub fields: Vec<Field>,
}

impl Segment {
    /// Field `n` (1-based). Absent trailing fields return `None`.
    pub fn field(&self, n: usize) -> Option<&Field> {
        if n == 0 {
            return None;
        }
        self.fields.get(n - 1)
    }
}

/// A field: one or more repetitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub repetitions: Vec<Repetition>,
}

impl Field {
    /// A field holding a single atomic text value.
    pub fn from_text(text: impl Into<String>) -> Self {
        Field {
            repetitions: vec![Repetition {
                components: vec![Component {
                    subcomponents: vec![text.into()],
                }],
            }],
        }
    }

    /// True when every subcomponent in every repetition is empty.
    pub fn is_empty(&self) -> bool {
        self.repetitions
            .iter()
            .all(|rep| rep.components.iter().all(Component::is_empty))
    }

    /// The raw text of the first subcomponent of the first component of the
    /// first repetition, if any. Convenient for atomic fields such as the
    /// header's message-type field components.
    pub fn first_text(&self) -> Option<&str> {
        self.repetitions
            .first()?
            .components
            .first()?
            .subcomponents
            .first()
            .map(String::as_str)
    }
}

/// One repetition of a field: one or more components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repetition {
    pub components: Vec<Component>,
}

impl Repetition {
    /// Component `n` (1-based).
    pub fn component(&self, n: usize) -> Option<&Component> {
        if n == 0 {
            return None;
        }
        self.components.get(n - 1)
    }

    /// True when the repetition carries a single component with a single
    /// subcomponent, i.e. an atomic value.
    pub fn is_atomic(&self) -> bool {
        self.components.len() == 1 && self.components[0].subcomponents.len() == 1
    }
}

/// A component: one or more subcomponents. A subcomponent is raw bar-grammar
/// text and the only carrier of escape sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub subcomponents: Vec<String>,
}

impl Component {
    pub fn is_empty(&self) -> bool {
        self.subcomponents.iter().all(String::is_empty)
    }
}
