//! Vertical-bar grammar front end.
//!
//! Turns raw bar-format message text into the [`hl7_model`] tree: strips the
//! optional transport-framing wrapper, resolves the message's separator set
//! from the MSH header, and tokenizes segments, fields, repetitions,
//! components and subcomponents with escape-aware splitting.

mod error;
mod framing;
mod separators;
mod tokenizer;

pub use error::{BarError, Result};
pub use framing::strip_framing;
pub use separators::resolve_separators;
pub use tokenizer::{parse_message, split_escaped};
