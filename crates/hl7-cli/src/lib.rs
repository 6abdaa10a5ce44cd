//! CLI library components for the HL7 transcoder.

pub mod logging;
pub mod pipeline;
