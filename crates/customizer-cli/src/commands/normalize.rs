use super::{json_pretty, load_schema, normalize_schema, TextRenderer, EXIT_SUCCESS};
use customizer_schema::{present, NormalizeOptions, Selection};
use std::path::Path;
use tracing::info;

pub fn run(schema_path: &Path, options: NormalizeOptions, json: bool) -> Result<u8, String> {
    let schema = load_schema(schema_path)?;
    info!(
        "normalizing {} with topping policy {}",
        schema_path.display(),
        options.topping_policy
    );
    let normalized = normalize_schema(&schema, options)?;

    if json {
        println!("{}", json_pretty(&normalized)?);
    } else if normalized.is_empty() {
        println!("schema has no properties");
    } else {
        let selection = Selection::new(normalized);
        let mut renderer = TextRenderer::default();
        present(&selection, &mut renderer).map_err(|e| format!("selection error: {e}"))?;
        print!("{}", renderer.finish());
    }
    Ok(EXIT_SUCCESS)
}
