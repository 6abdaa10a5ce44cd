//! Transcoding engine between the HL7 v2 vertical-bar grammar and the
//! v2.xml tagged grammar.
//!
//! The two directions are deliberately independent implementations sharing
//! only the message model and the escape codec: bar-to-tagged is
//! schema-aware and fail-fast, tagged-to-bar is purely structural and
//! serializes whatever nesting it is given. Each conversion is a
//! self-contained synchronous transform; the only shared state is the
//! read-only trigger table and structure catalog, so batches may run
//! conversions concurrently without coordination.

pub mod dom;

mod bar_to_xml;
mod error;
mod xml_to_bar;

pub use bar_to_xml::{bar_to_xml, emit_tagged, resolve_structure_id};
pub use error::{Result, TranscodeError};
pub use xml_to_bar::xml_to_bar;
