//! Error types for schema and trigger-table loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading schema material or resolving a structure.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Failed to read a schema or table file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Trigger table rows could not be parsed.
    #[error("failed to parse trigger table: {0}")]
    Table(#[from] csv::Error),

    /// A trigger-event specifier was neither a code, a list, nor a valid
    /// range.
    #[error("invalid trigger-event specifier {specifier:?}: {reason}")]
    InvalidSpecifier { specifier: String, reason: String },

    /// Structure lookup found no entry, or more than one.
    #[error(
        "unknown structure for message type {message_type:?} trigger {trigger:?}: {matches} table entries match"
    )]
    UnknownStructure {
        message_type: String,
        trigger: String,
        matches: usize,
    },

    /// The XML Schema text could not be read.
    #[error("failed to parse schema XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A schema attribute could not be decoded.
    #[error("failed to parse schema XML attribute: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// A structure or group definition lacked its content sequence.
    #[error("schema defines neither a sequence nor a choice for {name}")]
    MissingContent { name: String },
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
