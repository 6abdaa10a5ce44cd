//! Error types for bar-grammar parsing.

use hl7_model::EscapeError;
use thiserror::Error;

/// Errors that can occur while parsing a bar-format message.
#[derive(Debug, Error)]
pub enum BarError {
    /// The header segment could not declare a usable separator set, or the
    /// transport framing bytes were inconsistent.
    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// The message as a whole is unusable: no segments, or the wrong leading
    /// segment code.
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// An escape sequence inside a subcomponent was invalid.
    #[error(transparent)]
    Escape(#[from] EscapeError),
}

impl BarError {
    pub(crate) fn header(reason: impl Into<String>) -> Self {
        BarError::MalformedHeader {
            reason: reason.into(),
        }
    }

    pub(crate) fn message(reason: impl Into<String>) -> Self {
        BarError::MalformedMessage {
            reason: reason.into(),
        }
    }
}

/// Result type for bar-grammar parsing.
pub type Result<T> = std::result::Result<T, BarError>;
