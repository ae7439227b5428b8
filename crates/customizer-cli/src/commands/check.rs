use super::{json_pretty, load_schema, normalize_schema, EXIT_SUCCESS};
use customizer_schema::{NormalizeOptions, OptionEntry};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CheckReport {
    options: usize,
    resolved_items: usize,
    raw_values: usize,
    options_without_choices: Vec<String>,
}

pub fn run(schema_path: &Path, options: NormalizeOptions, json: bool) -> Result<u8, String> {
    let schema = load_schema(schema_path)?;
    let normalized = normalize_schema(&schema, options)?;

    let entries = || normalized.iter().flat_map(|o| o.entries());
    let report = CheckReport {
        options: normalized.len(),
        resolved_items: entries().filter(|e| e.is_item()).count(),
        raw_values: entries()
            .filter(|e| matches!(e, OptionEntry::Raw(_)))
            .count(),
        options_without_choices: normalized
            .iter()
            .filter(|o| o.entries().is_empty())
            .map(|o| o.option.clone())
            .collect(),
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!(
            "ok: {} options, {} catalog items, {} raw values",
            report.options, report.resolved_items, report.raw_values
        );
        for name in &report.options_without_choices {
            println!("  option '{name}' has no choices");
        }
    }
    Ok(EXIT_SUCCESS)
}
