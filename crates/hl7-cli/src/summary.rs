use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use hl7_cli::pipeline::RunResult;

/// Print the per-file batch outcome table. A stdin run already wrote its
/// result to stdout, so nothing is printed for it.
pub fn print_summary(result: &RunResult) {
    if result.wrote_stdout {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Input"),
        header_cell("Output"),
        header_cell("Error"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    for outcome in &result.outcomes {
        let output_cell = match &outcome.output {
            Some(path) => Cell::new(path.display()).fg(Color::Green),
            None => dim_cell("-"),
        };
        let error_cell = match &outcome.error {
            Some(error) => Cell::new(error).fg(Color::Red),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(outcome.input.display()),
            output_cell,
            error_cell,
        ]);
    }
    println!("{table}");
    println!("{} converted, {} failed", result.converted(), result.failed());
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
