//! Contract between the selection state and whatever draws it.
//!
//! The renderer gets one call per option, then a price tag and a quantity
//! control per entry. Changing a control maps back to
//! [`Selection::set_quantity`] with the control's `option` and `entry`.

use crate::normalize::{NormalizedOption, OptionEntry};
use crate::selection::{Selection, SelectionError};
use crate::types::Price;

/// Inputs of the "render price" capability. Both prices are in the same minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTag {
    pub selling: Price,
    pub list: Price,
    pub show_selling: bool,
    pub show_list: bool,
}

impl PriceTag {
    /// A single price with the list price hidden.
    pub fn selling_only(price: Price) -> Self {
        Self {
            selling: price,
            list: price,
            show_selling: true,
            show_list: false,
        }
    }
}

/// Inputs of the "render quantity control" capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityControl {
    pub option: String,
    pub entry: usize,
    pub label: String,
    pub value: u32,
    pub min: u32,
    pub max: Option<u32>,
}

pub trait OptionRenderer {
    fn render_option(&mut self, option: &NormalizedOption);

    fn render_price(&mut self, tag: &PriceTag);

    fn render_quantity_control(&mut self, control: &QuantityControl);

    /// Called once after all options, only when something is selected.
    fn render_total(&mut self, _total: Price, _satisfied: bool) {}
}

/// Drive `renderer` over every option of `selection`, in option order.
pub fn present<R: OptionRenderer + ?Sized>(
    selection: &Selection,
    renderer: &mut R,
) -> Result<(), SelectionError> {
    for option in selection.options() {
        renderer.render_option(option);
        for (entry, value) in option.entries().iter().enumerate() {
            let (min, max) = match value {
                OptionEntry::Item(item) => {
                    renderer.render_price(&PriceTag::selling_only(item.price));
                    (item.min_quantity, item.max_quantity)
                }
                OptionEntry::Raw(_) => (0, None),
            };
            renderer.render_quantity_control(&QuantityControl {
                option: option.option.clone(),
                entry,
                label: value.label(),
                value: selection.quantity(&option.option, entry).unwrap_or(0),
                min,
                max,
            });
        }
    }

    if selection.has_selection() {
        renderer.render_total(selection.total()?, selection.is_satisfied());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::schema::parse_schema_str;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl OptionRenderer for Recorder {
        fn render_option(&mut self, option: &NormalizedOption) {
            self.calls.push(format!("option {}", option.option));
        }

        fn render_price(&mut self, tag: &PriceTag) {
            self.calls
                .push(format!("price {} list_shown={}", tag.selling, tag.show_list));
        }

        fn render_quantity_control(&mut self, control: &QuantityControl) {
            self.calls.push(format!(
                "qty {}[{}] {}={} {}..{:?}",
                control.option, control.entry, control.label, control.value, control.min, control.max
            ));
        }

        fn render_total(&mut self, total: Price, satisfied: bool) {
            self.calls.push(format!("total {total} satisfied={satisfied}"));
        }
    }

    fn selection() -> Selection {
        let schema = parse_schema_str(
            r#"{
  "items": [{"id": "ham", "name": "Ham", "price": 300, "minQuantity": 0, "maxQuantity": 3}],
  "properties": {
    "toppings": {"type": "array", "items": {"enum": ["ham", "cheese"]}, "required": true}
  }
}"#,
        )
        .unwrap();
        Selection::new(normalize(&schema).unwrap())
    }

    #[test]
    fn renders_prices_and_controls_in_order() {
        let sel = selection();
        let mut rec = Recorder::default();
        present(&sel, &mut rec).unwrap();
        assert_eq!(
            rec.calls,
            vec![
                "option toppings",
                "price 3.00 list_shown=false",
                "qty toppings[0] Ham=0 0..Some(3)",
                "qty toppings[1] cheese=0 0..None",
            ]
        );
    }

    #[test]
    fn renders_total_once_something_is_chosen() {
        let mut sel = selection();
        sel.set_quantity("toppings", 0, 2).unwrap();
        let mut rec = Recorder::default();
        present(&sel, &mut rec).unwrap();
        assert_eq!(rec.calls.last().unwrap(), "total 6.00 satisfied=true");
        assert!(rec.calls.contains(&"qty toppings[0] Ham=2 0..Some(3)".to_owned()));
    }

    #[test]
    fn control_maps_back_to_selection() {
        let mut sel = selection();
        let control = QuantityControl {
            option: "toppings".to_owned(),
            entry: 1,
            label: "cheese".to_owned(),
            value: 0,
            min: 0,
            max: None,
        };
        sel.set_quantity(&control.option, control.entry, 1).unwrap();
        assert_eq!(sel.quantity("toppings", 1), Some(1));
    }
}
