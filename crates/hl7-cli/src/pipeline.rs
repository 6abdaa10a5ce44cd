//! File and stream conversion pipelines.
//!
//! A run converts a single input (file or stdin) or every file in a
//! directory. Stdin input writes to stdout; file input writes alongside the
//! input (or under the output directory) with the direction's extension.
//! Failures are isolated per file: the batch continues and every outcome is
//! reported.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hl7_schema::{StructureCatalog, TriggerTable};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

/// File name of the trigger-event table inside the schema directory.
pub const TRIGGER_TABLE_FILE: &str = "hl7Table0354.csv";

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Vertical-bar text to tagged XML.
    BarToXml,
    /// Tagged XML to vertical-bar text.
    XmlToBar,
}

impl Direction {
    /// Extension of the files this direction produces.
    pub fn output_extension(self) -> &'static str {
        match self {
            Direction::BarToXml => "xml",
            Direction::XmlToBar => "hl7",
        }
    }

    /// Prefix applied when the output name would collide with the input.
    fn collision_prefix(self) -> &'static str {
        match self {
            Direction::BarToXml => "XML_",
            Direction::XmlToBar => "HL7_",
        }
    }
}

/// One direction's conversion context, shared read-only across a batch.
pub enum Converter {
    ToXml {
        table: TriggerTable,
        catalog: StructureCatalog,
    },
    ToBar,
}

impl Converter {
    /// Build the bar-to-XML converter, loading the trigger table from the
    /// schema directory up front. Structure definitions load on demand.
    pub fn to_xml(schema_dir: &Path) -> Result<Self> {
        let table_path = schema_dir.join(TRIGGER_TABLE_FILE);
        let table = TriggerTable::load(&table_path)
            .with_context(|| format!("load trigger table {}", table_path.display()))?;
        Ok(Converter::ToXml {
            table,
            catalog: StructureCatalog::new(schema_dir),
        })
    }

    pub fn to_bar() -> Self {
        Converter::ToBar
    }

    pub fn direction(&self) -> Direction {
        match self {
            Converter::ToXml { .. } => Direction::BarToXml,
            Converter::ToBar => Direction::XmlToBar,
        }
    }

    /// Convert one document.
    pub fn convert(&self, text: &str) -> Result<String> {
        match self {
            Converter::ToXml { table, catalog } => {
                Ok(hl7_transcode::bar_to_xml(text, table, catalog)?)
            }
            Converter::ToBar => Ok(hl7_transcode::xml_to_bar(text)?),
        }
    }
}

/// Which inputs a run covers, straight from the CLI flags.
#[derive(Debug, Clone, Default)]
pub struct InputSelection {
    /// Single input file, `-` for stdin.
    pub input: Option<PathBuf>,
    /// Directory whose files are all converted; combined with `input` it
    /// only supplies the base directory.
    pub input_dir: Option<PathBuf>,
}

/// Outcome of one file conversion.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunResult {
    pub outcomes: Vec<FileOutcome>,
    /// True when the conversion went to stdout rather than files.
    pub wrote_stdout: bool,
}

impl RunResult {
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.converted()
    }

    pub fn has_errors(&self) -> bool {
        self.failed() > 0
    }
}

/// Run one conversion pass over the selected inputs.
///
/// Stdin errors abort the run; file errors are recorded per file and the
/// batch continues.
pub fn run(
    converter: &Converter,
    selection: &InputSelection,
    output_dir: Option<&Path>,
) -> Result<RunResult> {
    match resolve_inputs(selection)? {
        Inputs::Stdin => run_stdin(converter),
        Inputs::Files(files) => Ok(run_files(converter, &files, output_dir)),
    }
}

enum Inputs {
    Stdin,
    Files(Vec<PathBuf>),
}

fn resolve_inputs(selection: &InputSelection) -> Result<Inputs> {
    if let Some(input) = &selection.input {
        if input.as_os_str() == "-" {
            return Ok(Inputs::Stdin);
        }
        let path = match &selection.input_dir {
            Some(dir) => dir.join(input),
            None => input.clone(),
        };
        return Ok(Inputs::Files(vec![path]));
    }
    let Some(dir) = &selection.input_dir else {
        return Ok(Inputs::Stdin);
    };
    let entries =
        fs::read_dir(dir).with_context(|| format!("read input directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(Inputs::Files(files))
}

fn run_stdin(converter: &Converter) -> Result<RunResult> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("read stdin")?;
    let converted = converter.convert(&text).context("convert stdin")?;
    io::stdout()
        .write_all(converted.as_bytes())
        .context("write stdout")?;
    Ok(RunResult {
        outcomes: vec![FileOutcome {
            input: PathBuf::from("-"),
            output: None,
            error: None,
        }],
        wrote_stdout: true,
    })
}

fn run_files(converter: &Converter, files: &[PathBuf], output_dir: Option<&Path>) -> RunResult {
    let progress = if files.len() > 1 {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };
    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        if let Some(bar) = &progress {
            bar.set_message(file.display().to_string());
        }
        let outcome = match convert_file(converter, file, output_dir) {
            Ok(output) => {
                info!(input = %file.display(), output = %output.display(), "converted");
                FileOutcome {
                    input: file.clone(),
                    output: Some(output),
                    error: None,
                }
            }
            Err(err) => {
                error!(input = %file.display(), "conversion failed: {err:#}");
                FileOutcome {
                    input: file.clone(),
                    output: None,
                    error: Some(format!("{err:#}")),
                }
            }
        };
        outcomes.push(outcome);
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }
    RunResult {
        outcomes,
        wrote_stdout: false,
    }
}

fn convert_file(converter: &Converter, input: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    let text =
        fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let converted = converter.convert(&text)?;
    let output = output_path(input, output_dir, converter.direction());
    if let Some(dir) = output.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(&output, converted).with_context(|| format!("write {}", output.display()))?;
    Ok(output)
}

/// Where a converted file lands: the input name with the direction's
/// extension, next to the input unless an output directory is given, with a
/// prefix when the name would overwrite the input itself.
fn output_path(input: &Path, output_dir: Option<&Path>, direction: Direction) -> PathBuf {
    let renamed = input.with_extension(direction.output_extension());
    let name: OsString = renamed
        .file_name()
        .map_or_else(|| OsString::from(direction.output_extension()), ToOwned::to_owned);
    let dir = output_dir.map_or_else(
        || input.parent().map(Path::to_path_buf).unwrap_or_default(),
        Path::to_path_buf,
    );
    let candidate = dir.join(&name);
    if candidate == input {
        let mut prefixed = OsString::from(direction.collision_prefix());
        prefixed.push(&name);
        return dir.join(prefixed);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_keeps_the_stem_and_swaps_the_extension() {
        let out = output_path(Path::new("msgs/adt.hl7"), None, Direction::BarToXml);
        assert_eq!(out, Path::new("msgs/adt.xml"));
    }

    #[test]
    fn output_dir_overrides_the_input_directory() {
        let out = output_path(
            Path::new("msgs/adt.hl7"),
            Some(Path::new("out")),
            Direction::BarToXml,
        );
        assert_eq!(out, Path::new("out/adt.xml"));
    }

    #[test]
    fn colliding_name_gets_a_prefix() {
        let out = output_path(Path::new("msgs/adt.xml"), None, Direction::BarToXml);
        assert_eq!(out, Path::new("msgs/XML_adt.xml"));
        let out = output_path(Path::new("msgs/adt.hl7"), None, Direction::XmlToBar);
        assert_eq!(out, Path::new("msgs/HL7_adt.hl7"));
    }

    #[test]
    fn no_collision_across_directories() {
        let out = output_path(
            Path::new("msgs/adt.xml"),
            Some(Path::new("out")),
            Direction::BarToXml,
        );
        assert_eq!(out, Path::new("out/adt.xml"));
    }
}
