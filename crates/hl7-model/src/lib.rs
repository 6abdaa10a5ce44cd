//! Hierarchical HL7 v2 message model shared by both conversion directions.
//!
//! A message is an ordered tree: segments hold fields, fields hold
//! repetitions, repetitions hold components, components hold subcomponents.
//! The subcomponent is the only level that carries text, and the only level
//! where escape sequences may appear.
//!
//! The five separator characters are message-scoped, not process-wide: every
//! message declares its own set in the MSH header, so [`SeparatorSet`] is
//! threaded explicitly through every parse and emit call.

pub mod escape;
pub mod message;
pub mod separators;

pub use escape::{EscapeError, TextPart, decode, decode_parts, encode};
pub use message::{Component, Field, Message, Repetition, Segment};
pub use separators::{SeparatorError, SeparatorSet};

/// Segment code that opens every message and declares its separators.
pub const HEADER_CODE: &str = "MSH";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes() {
        let message = Message {
            segments: vec![Segment {
                code: "MSH".to_string(),
                fields: vec![Field::from_text("|")],
            }],
        };
        let json = serde_json::to_string(&message).expect("serialize message");
        let round: Message = serde_json::from_str(&json).expect("deserialize message");
        assert_eq!(round, message);
    }
}
