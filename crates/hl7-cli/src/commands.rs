use anyhow::Result;
use tracing::info_span;

use hl7_cli::pipeline::{Converter, InputSelection, RunResult, run};

use crate::cli::{ConvertArgs, ToXmlArgs};

pub fn run_to_xml(args: &ToXmlArgs) -> Result<RunResult> {
    let span = info_span!("to_xml");
    let _guard = span.enter();
    let converter = Converter::to_xml(&args.schema_dir)?;
    run_convert(&converter, &args.convert)
}

pub fn run_to_bar(args: &ConvertArgs) -> Result<RunResult> {
    let span = info_span!("to_bar");
    let _guard = span.enter();
    run_convert(&Converter::to_bar(), args)
}

fn run_convert(converter: &Converter, args: &ConvertArgs) -> Result<RunResult> {
    let selection = InputSelection {
        input: args.input.clone(),
        input_dir: args.input_dir.clone(),
    };
    run(converter, &selection, args.output_dir.as_deref())
}
