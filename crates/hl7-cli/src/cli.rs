//! CLI argument definitions for the HL7 transcoder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "hl7-transcode",
    version,
    about = "Convert HL7 v2 messages between vertical-bar and XML encodings",
    long_about = "Convert HL7 v2.x messages between the vertical-bar encoding and the\n\
                  v2.xml tagged encoding.\n\n\
                  to-xml matches each message against its v2.xml message-structure\n\
                  schema; to-bar serializes any well-formed v2.xml document without\n\
                  validation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert vertical-bar messages to v2.xml documents.
    ToXml(ToXmlArgs),

    /// Convert v2.xml documents to vertical-bar messages.
    ToBar(ConvertArgs),
}

#[derive(Parser)]
pub struct ToXmlArgs {
    #[command(flatten)]
    pub convert: ConvertArgs,

    /// Schema directory holding xsd/<STRUCTURE>.xsd files and the
    /// trigger-event table.
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dir: PathBuf,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Input file, or `-` for stdin. Stdin output goes to stdout.
    #[arg(long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Convert every file in this directory; with --input, the directory
    /// the input file is looked up in.
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory for converted files (default: alongside each input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
