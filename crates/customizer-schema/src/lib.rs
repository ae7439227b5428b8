//! Product schema parsing, option normalization, and selection state for the
//! product customizer.
//!
//! This crate defines the schema layer: JSON product schema parsing
//! (`ProductSchema`), the schema normalizer (`Customizer`) that resolves each
//! property's enumerated candidates against the item catalog into
//! `NormalizedOption`s, the selection controller (`Selection`) that tracks chosen
//! quantities and computes the order total, and the display contract
//! (`OptionRenderer`) consumed by whatever renders the options.

pub mod config;
pub mod display;
pub mod normalize;
pub mod schema;
pub mod selection;
pub mod types;

pub use config::{ConfigError, CustomizerConfig, NormalizeSection, DEFAULT_CONFIG_FILE};
pub use display::{present, OptionRenderer, PriceTag, QuantityControl};
pub use normalize::{
    normalize, Customizer, NormalizeError, NormalizeOptions, NormalizedOption, OptionEntry,
    OptionItems, ToppingPolicy,
};
pub use schema::{
    parse_schema_file, parse_schema_str, Item, ProductSchema, Properties, Property,
    PropertyType, SchemaError,
};
pub use selection::{Selection, SelectionChange, SelectionError, SelectionObserver};
pub use types::{Candidate, ItemId, Price};
