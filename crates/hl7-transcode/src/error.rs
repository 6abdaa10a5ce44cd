//! Error types for the two conversion paths.
//!
//! Only the schema-aware bar-to-tagged path raises structural errors; the
//! tagged-to-bar path performs no validation and fails only when the XML
//! itself is unreadable or the header fields needed for separator
//! reconstruction are missing.

use hl7_bar::BarError;
use hl7_model::EscapeError;
use hl7_schema::SchemaError;
use thiserror::Error;

/// Errors that can occur during one message conversion.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Bar-grammar parsing failed.
    #[error(transparent)]
    Bar(#[from] BarError),

    /// Schema or trigger-table material was missing or ambiguous.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A required structure node could not be matched against the segment
    /// sequence.
    #[error("structure mismatch at segment {segment_index}: expected {expected}, found {found}")]
    StructureMismatch {
        expected: String,
        segment_index: usize,
        found: String,
    },

    /// Segments remained after the structure tree was exhausted.
    #[error("segment {code} at index {segment_index} not consumed by the message structure")]
    UnconsumedSegments { segment_index: usize, code: String },

    /// A subcomponent carried an invalid escape sequence.
    #[error("invalid escape in segment {segment_index} ({code}) field {field}: {source}")]
    Escape {
        segment_index: usize,
        code: String,
        field: usize,
        #[source]
        source: EscapeError,
    },

    /// The tagged document is structurally unusable (missing root, missing
    /// header separator fields).
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// The tagged document is not well-formed XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Writing the document failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    pub(crate) fn document(reason: impl Into<String>) -> Self {
        TranscodeError::MalformedDocument {
            reason: reason.into(),
        }
    }
}

/// Result type for conversions.
pub type Result<T> = std::result::Result<T, TranscodeError>;
