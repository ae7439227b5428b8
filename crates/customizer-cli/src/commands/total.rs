use super::{
    json_pretty, load_schema, normalize_schema, parse_pick, EXIT_SELECTION_ERROR, EXIT_SUCCESS,
};
use customizer_schema::{NormalizeOptions, Selection};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Serialize)]
struct PickLine {
    option: String,
    choice: String,
    quantity: u32,
    line_total: String,
}

#[derive(Debug, Serialize)]
struct TotalReport {
    picks: Vec<PickLine>,
    total_minor: i64,
    total: String,
    satisfied: bool,
}

pub fn run(
    schema_path: &Path,
    options: NormalizeOptions,
    picks: &[String],
    require_satisfied: bool,
    json: bool,
) -> Result<u8, String> {
    let schema = load_schema(schema_path)?;
    let mut selection = Selection::new(normalize_schema(&schema, options)?);

    let mut lines = Vec::with_capacity(picks.len());
    for pick in picks {
        let (option, choice, quantity) = parse_pick(pick)?;
        let change = selection
            .set_quantity_by_key(&option, &choice, quantity)
            .map_err(|e| format!("selection error: {e}"))?;
        debug!("applied pick {pick}");
        let line_total = change
            .value
            .as_item()
            .and_then(|item| item.price.checked_mul(quantity))
            .map_or_else(|| "-".to_owned(), |p| p.to_string());
        lines.push(PickLine {
            option,
            choice: change.value.label(),
            quantity,
            line_total,
        });
    }

    let total = selection
        .total()
        .map_err(|e| format!("selection error: {e}"))?;
    let report = TotalReport {
        picks: lines,
        total_minor: total.minor_units(),
        total: total.to_string(),
        satisfied: selection.is_satisfied(),
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for line in &report.picks {
            println!(
                "{:<16} {:<24} x{:<4} {:>10}",
                line.option, line.choice, line.quantity, line.line_total
            );
        }
        println!("total: {}", report.total);
        println!(
            "required options satisfied: {}",
            if report.satisfied { "yes" } else { "no" }
        );
    }

    if require_satisfied && !report.satisfied {
        eprintln!("error: selection does not satisfy every required option");
        return Ok(EXIT_SELECTION_ERROR);
    }
    Ok(EXIT_SUCCESS)
}
