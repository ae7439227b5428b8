use crate::schema::{Item, ProductSchema, Property, PropertyType};
use crate::types::{Candidate, IdKey, ItemId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("property '{property}' is declared as an array but has no `items` schema")]
    MissingArrayItems { property: String },
    #[error("property '{property}' has an invalid enum: {reason}")]
    InvalidEnum { property: String, reason: String },
}

/// How a property's `isTopping` flag is derived from its candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToppingPolicy {
    /// The flag reflects only the last candidate: `true` if it did not resolve.
    /// Matches the behavior existing storefronts were built against.
    #[default]
    LastWins,
    /// The flag is `true` if any candidate did not resolve.
    AnyUnresolved,
}

impl fmt::Display for ToppingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWins => f.write_str("last-wins"),
            Self::AnyUnresolved => f.write_str("any-unresolved"),
        }
    }
}

impl FromStr for ToppingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-wins" => Ok(Self::LastWins),
            "any-unresolved" => Ok(Self::AnyUnresolved),
            other => Err(format!(
                "unknown topping policy '{other}', expected 'last-wins' or 'any-unresolved'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub topping_policy: ToppingPolicy,
}

/// One candidate of a normalized option: either the catalog item it named or
/// the raw value itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptionEntry {
    Item(Item),
    Raw(Candidate),
}

impl OptionEntry {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Raw(_) => None,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }

    /// Human-readable name: the item name, or the raw value without JSON quoting.
    pub fn label(&self) -> String {
        match self {
            Self::Item(item) => item.name.clone(),
            Self::Raw(Candidate::String(value)) => value.clone(),
            Self::Raw(other) => other.to_string(),
        }
    }
}

/// The `items` of a normalized option.
///
/// On input an array is read as `Resolved` only when it is non-empty and every
/// element is a tagged entry; `[]` and anything else stay `Passthrough`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionItems {
    /// One entry per candidate, in enum order.
    Resolved(Vec<OptionEntry>),
    /// Whatever the property already carried when it had no candidates.
    Passthrough(serde_json::Value),
}

impl OptionItems {
    pub fn entries(&self) -> &[OptionEntry] {
        match self {
            Self::Resolved(entries) => entries,
            Self::Passthrough(_) => &[],
        }
    }
}

impl<'de> Deserialize<'de> for OptionItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let resolved = match &value {
            serde_json::Value::Array(values) if !values.is_empty() => {
                Vec::<OptionEntry>::deserialize(&value).ok()
            }
            _ => None,
        };
        Ok(resolved.map_or(Self::Passthrough(value), Self::Resolved))
    }
}

/// Display-ready description of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOption {
    pub option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<OptionItems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_topping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

impl NormalizedOption {
    pub fn entries(&self) -> &[OptionEntry] {
        match &self.items {
            Some(items) => items.entries(),
            None => &[],
        }
    }

    pub fn is_required(&self) -> bool {
        self.required == Some(true)
    }
}

/// Schema normalizer bound to one product schema.
///
/// The catalog index is built once at construction; `serialize` never mutates
/// the schema, so every call over the same schema yields the same options.
pub struct Customizer<'a> {
    schema: &'a ProductSchema,
    index: HashMap<IdKey, usize>,
    options: NormalizeOptions,
}

impl<'a> Customizer<'a> {
    pub fn new(schema: &'a ProductSchema) -> Self {
        Self::with_options(schema, NormalizeOptions::default())
    }

    pub fn with_options(schema: &'a ProductSchema, options: NormalizeOptions) -> Self {
        let mut index = HashMap::with_capacity(schema.items.len());
        for (pos, item) in schema.items.iter().enumerate() {
            match index.entry(item.id.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(pos);
                }
                Entry::Occupied(_) => {
                    warn!("duplicate catalog id '{}', keeping the first item", item.id);
                }
            }
        }
        Self {
            schema,
            index,
            options,
        }
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Resolve every property against the catalog, in property order.
    pub fn serialize(&self) -> Result<Vec<NormalizedOption>, NormalizeError> {
        self.schema
            .properties
            .iter()
            .map(|(name, property)| self.normalize_property(name, property))
            .collect()
    }

    /// First catalog item whose id is exactly `candidate`.
    pub fn find_item(&self, candidate: &Candidate) -> Option<&'a Item> {
        let id = ItemId::from_candidate(candidate)?;
        let pos = *self.index.get(&id.key())?;
        let item = &self.schema.items[pos];
        item.id.matches(candidate).then_some(item)
    }

    fn normalize_property(
        &self,
        name: &str,
        property: &Property,
    ) -> Result<NormalizedOption, NormalizeError> {
        let (items, is_topping) = match candidates_for(name, property)? {
            Some(candidates) if !candidates.is_empty() => {
                let (entries, is_topping) = self.resolve(name, candidates);
                (Some(OptionItems::Resolved(entries)), Some(is_topping))
            }
            _ => {
                trace!("property '{name}' has no candidates, passing through");
                (
                    property.items.clone().map(OptionItems::Passthrough),
                    property.is_topping,
                )
            }
        };

        Ok(NormalizedOption {
            option: name.to_owned(),
            choice_type: property.choice_type.clone(),
            description: property.description.clone(),
            items,
            is_topping,
            min_items: property.min_items,
            max_items: property.max_items,
            required: property.required,
            unique_items: property.unique_items,
        })
    }

    fn resolve(&self, name: &str, candidates: &[Candidate]) -> (Vec<OptionEntry>, bool) {
        let mut entries = Vec::with_capacity(candidates.len());
        let mut is_topping = false;
        let mut unresolved = 0usize;

        for candidate in candidates {
            let entry = if let Some(item) = self.find_item(candidate) {
                OptionEntry::Item(item.clone())
            } else {
                trace!("property '{name}': candidate {candidate} is not in the catalog");
                unresolved += 1;
                OptionEntry::Raw(candidate.clone())
            };

            is_topping = match self.options.topping_policy {
                ToppingPolicy::LastWins => !entry.is_item(),
                ToppingPolicy::AnyUnresolved => is_topping || !entry.is_item(),
            };
            entries.push(entry);
        }

        debug!(
            "resolved property '{name}': {} candidates, {unresolved} unresolved, is_topping={is_topping}",
            candidates.len()
        );
        (entries, is_topping)
    }
}

/// Normalize `schema` with the default (last-wins) topping policy.
pub fn normalize(schema: &ProductSchema) -> Result<Vec<NormalizedOption>, NormalizeError> {
    Customizer::new(schema).serialize()
}

fn candidates_for<'p>(
    name: &str,
    property: &'p Property,
) -> Result<Option<&'p [Candidate]>, NormalizeError> {
    match property.kind {
        Some(PropertyType::String) => Ok(property.candidates.as_deref()),
        Some(PropertyType::Array) => {
            let Some(items) = &property.items else {
                return Err(NormalizeError::MissingArrayItems {
                    property: name.to_owned(),
                });
            };
            let Some(enum_value) = items.get("enum") else {
                return Ok(None);
            };
            match enum_value {
                serde_json::Value::Array(values) => Ok(Some(values.as_slice())),
                serde_json::Value::Null => Ok(None),
                other => Err(NormalizeError::InvalidEnum {
                    property: name.to_owned(),
                    reason: format!("`items.enum` must be an array, found {other}"),
                }),
            }
        }
        Some(PropertyType::Other) | None => Ok(None),
    }
}
