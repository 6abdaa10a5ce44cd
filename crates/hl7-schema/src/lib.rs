//! Externally supplied schema material for the bar-to-tagged direction.
//!
//! Two read-only inputs are loaded once per process and shared across all
//! conversions: the trigger-event table mapping (message type, trigger
//! event) to a message-structure identifier, and the per-structure segment
//! arrangement parsed from the v2.xml XML Schema files.

mod error;
mod structure;
mod trigger;
mod xsd;

pub use error::{Result, SchemaError};
pub use structure::{GroupNode, MessageStructure, SegmentNode, StructureNode};
pub use trigger::{TriggerTable, expand_specifier};
pub use xsd::{StructureCatalog, parse_structure};
