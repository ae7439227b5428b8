pub mod check;
pub mod normalize;
pub mod total;

use console::Style;
use customizer_schema::{
    Customizer, CustomizerConfig, NormalizeOptions, NormalizedOption, OptionRenderer, Price,
    PriceTag, ProductSchema, QuantityControl,
};
use std::fmt::Write as _;
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_SCHEMA_ERROR: u8 = 2;
pub const EXIT_SELECTION_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_config(path: &Path) -> Result<CustomizerConfig, String> {
    CustomizerConfig::load_or_default(path).map_err(|e| format!("config error: {e}"))
}

pub fn load_schema(path: &Path) -> Result<ProductSchema, String> {
    customizer_schema::parse_schema_file(path).map_err(|e| e.to_string())
}

pub fn normalize_schema(
    schema: &ProductSchema,
    options: NormalizeOptions,
) -> Result<Vec<NormalizedOption>, String> {
    Customizer::with_options(schema, options)
        .serialize()
        .map_err(|e| format!("schema error: {e}"))
}

/// Parse `OPTION=CHOICE:QTY`. The quantity may be omitted and defaults to 1.
pub fn parse_pick(pick: &str) -> Result<(String, String, u32), String> {
    let Some((option, rest)) = pick.split_once('=') else {
        return Err(format!("invalid pick '{pick}', expected OPTION=CHOICE:QTY"));
    };
    let (choice, quantity) = match rest.rsplit_once(':') {
        Some((choice, qty)) => {
            let qty = qty
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid pick '{pick}': quantity '{qty}' is not a number"))?;
            (choice, qty)
        }
        None => (rest, 1),
    };
    let option = option.trim();
    let choice = choice.trim();
    if option.is_empty() || choice.is_empty() {
        return Err(format!("invalid pick '{pick}', expected OPTION=CHOICE:QTY"));
    }
    Ok((option.to_owned(), choice.to_owned(), quantity))
}

pub fn colorize_choice(label: &str, resolved: bool) -> String {
    if resolved {
        Style::new().green().apply_to(label).to_string()
    } else {
        Style::new().yellow().apply_to(label).to_string()
    }
}

/// Plain-text option listing.
#[derive(Default)]
pub struct TextRenderer {
    out: String,
    pending_price: Option<PriceTag>,
}

impl TextRenderer {
    pub fn finish(self) -> String {
        self.out
    }
}

impl OptionRenderer for TextRenderer {
    fn render_option(&mut self, option: &NormalizedOption) {
        let _ = write!(self.out, "{}", Style::new().bold().apply_to(&option.option));
        if let Some(choice_type) = &option.choice_type {
            let _ = write!(self.out, " ({choice_type})");
        }
        if option.is_required() {
            self.out.push_str(" [required]");
        }
        if option.is_topping == Some(true) {
            self.out.push_str(" [topping]");
        }
        if let Some(description) = &option.description {
            let _ = write!(self.out, ": {description}");
        }
        self.out.push('\n');
        if option.entries().is_empty() {
            self.out.push_str("  (no choices)\n");
        }
    }

    fn render_price(&mut self, tag: &PriceTag) {
        self.pending_price = Some(*tag);
    }

    fn render_quantity_control(&mut self, control: &QuantityControl) {
        let price = self.pending_price.take();
        let label = colorize_choice(&control.label, price.is_some());
        let _ = write!(self.out, "  {label:<24}");
        if let Some(tag) = price {
            if tag.show_selling {
                let _ = write!(self.out, " {:>10}", tag.selling);
            }
            if tag.show_list && tag.list != tag.selling {
                let _ = write!(self.out, " (was {})", tag.list);
            }
        } else {
            let _ = write!(self.out, " {:>10}", "-");
        }
        let max = control
            .max
            .map_or_else(|| "*".to_owned(), |m| m.to_string());
        let _ = writeln!(self.out, "  qty {} ({}..{max})", control.value, control.min);
    }

    fn render_total(&mut self, total: Price, satisfied: bool) {
        let _ = writeln!(
            self.out,
            "total: {total}{}",
            if satisfied { "" } else { " (required options missing)" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use customizer_schema::{parse_schema_str, present, Selection};

    #[test]
    fn json_pretty_serializes_value() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn parse_pick_full() {
        assert_eq!(
            parse_pick("toppings=ham:2").unwrap(),
            ("toppings".to_owned(), "ham".to_owned(), 2)
        );
    }

    #[test]
    fn parse_pick_defaults_quantity_to_one() {
        assert_eq!(
            parse_pick("size=large").unwrap(),
            ("size".to_owned(), "large".to_owned(), 1)
        );
    }

    #[test]
    fn parse_pick_keeps_colons_in_choice() {
        assert_eq!(
            parse_pick("note=a:b:3").unwrap(),
            ("note".to_owned(), "a:b".to_owned(), 3)
        );
    }

    #[test]
    fn parse_pick_rejects_malformed() {
        assert!(parse_pick("toppings").unwrap_err().starts_with("invalid pick"));
        assert!(parse_pick("=ham:1").is_err());
        assert!(parse_pick("toppings=ham:lots").is_err());
        assert!(parse_pick("toppings=ham:-1").is_err());
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_SCHEMA_ERROR);
        assert_ne!(EXIT_SCHEMA_ERROR, EXIT_SELECTION_ERROR);
    }

    #[test]
    fn normalize_schema_prefixes_errors() {
        let schema = parse_schema_str(r#"{"properties": {"x": {"type": "array"}}}"#).unwrap();
        let err = normalize_schema(&schema, NormalizeOptions::default()).unwrap_err();
        assert!(err.starts_with("schema error:"));
    }

    #[test]
    fn text_renderer_lists_choices() {
        console::set_colors_enabled(false);
        let schema = parse_schema_str(
            r#"{
  "items": [{"id": "ham", "name": "Ham", "price": 300, "maxQuantity": 3}],
  "properties": {
    "toppings": {"type": "array", "items": {"enum": ["ham", "cheese"]}, "choiceType": "multiple", "description": "Pick toppings"}
  }
}"#,
        )
        .unwrap();
        let options = normalize_schema(&schema, NormalizeOptions::default()).unwrap();
        let mut selection = Selection::new(options);
        selection.set_quantity("toppings", 0, 2).unwrap();

        let mut renderer = TextRenderer::default();
        present(&selection, &mut renderer).unwrap();
        let text = renderer.finish();

        assert!(text.starts_with("toppings (multiple) [topping]: Pick toppings\n"));
        assert!(text.contains("Ham"));
        assert!(text.contains("3.00"));
        assert!(text.contains("qty 2 (0..3)"));
        assert!(text.contains("qty 0 (0..*)"));
        assert!(text.ends_with("total: 6.00\n"));
    }
}
