use crate::types::{Candidate, ItemId, Price};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schema: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// A customizable product: the item catalog plus the configurable properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSchema {
    #[serde(default)]
    pub items: Vec<Item>,
    pub properties: Properties,
}

/// A concrete, priced catalog entry with quantity bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(alias = "Id")]
    pub id: ItemId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub min_quantity: u32,
    /// Inclusive upper bound; `None` leaves the quantity unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_quantity: Option<u32>,
}

impl Item {
    pub fn accepts_quantity(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity && self.max_quantity.map_or(true, |max| quantity <= max)
    }
}

/// How many choices a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Single choice, candidates under `enum`.
    String,
    /// Multiple choices, candidates under `items.enum`.
    Array,
    /// Any other declared type. Never resolved.
    #[serde(other)]
    Other,
}

/// One configurable aspect of the product.
///
/// Everything except `type`, `enum`, and `items` is display/validation metadata
/// that the normalizer copies through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyType>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,
    /// Sub-schema holding `enum` for array properties; carried through as-is otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_topping: Option<bool>,
}

/// Properties keyed by name, in document order.
///
/// Re-inserting an existing name replaces the property but keeps its original
/// position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, Property)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, property: Property) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = property;
        } else {
            self.entries.push((name, property));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, property)| property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries
            .iter()
            .map(|(key, property)| (key.as_str(), property))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Property)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, Property)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (name, property) in iter {
            properties.insert(name, property);
        }
        properties
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, property) in &self.entries {
            map.serialize_entry(name, property)?;
        }
        map.end()
    }
}

struct PropertiesVisitor;

impl<'de> Visitor<'de> for PropertiesVisitor {
    type Value = Properties;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of property name to property schema")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut properties = Properties::new();
        while let Some(name) = access.next_key::<String>()? {
            let raw: serde_json::Value = access.next_value()?;
            let property = Property::deserialize(raw).map_err(|e| {
                <A::Error as de::Error>::custom(format!("property '{name}': {e}"))
            })?;
            properties.insert(name, property);
        }
        Ok(properties)
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropertiesVisitor)
    }
}

pub fn parse_schema_str(input: &str) -> Result<ProductSchema, SchemaError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_schema_file(path: impl AsRef<Path>) -> Result<ProductSchema, SchemaError> {
    let content = fs::read_to_string(path)?;
    parse_schema_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_schema() {
        let input = r#"{
  "items": [
    {"id": "ham", "name": "Ham", "price": 300, "image": "ham.png", "minQuantity": 0, "maxQuantity": 3}
  ],
  "properties": {
    "toppings": {
      "type": "array",
      "items": {"enum": ["ham", "cheese"]},
      "minItems": 0,
      "maxItems": 2,
      "required": false,
      "uniqueItems": false,
      "choiceType": "multiple",
      "description": "Pick toppings"
    },
    "size": {"type": "string", "enum": ["small", "large"]}
  }
}"#;
        let schema = parse_schema_str(input).expect("should parse");
        assert_eq!(schema.items.len(), 1);
        assert_eq!(schema.items[0].price, Price::from_minor(300));
        assert_eq!(schema.items[0].max_quantity, Some(3));

        let toppings = schema.properties.get("toppings").unwrap();
        assert_eq!(toppings.kind, Some(PropertyType::Array));
        assert_eq!(toppings.max_items, Some(2));
        assert_eq!(toppings.choice_type.as_deref(), Some("multiple"));

        let size = schema.properties.get("size").unwrap();
        assert_eq!(size.kind, Some(PropertyType::String));
        assert_eq!(size.candidates.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn preserves_property_document_order() {
        let input = r#"{"properties": {"zeta": {}, "alpha": {}, "mid": {}}}"#;
        let schema = parse_schema_str(input).unwrap();
        let keys: Vec<_> = schema.properties.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let json = serde_json::to_string(&schema.properties).unwrap();
        assert_eq!(json, r#"{"zeta":{},"alpha":{},"mid":{}}"#);
    }

    #[test]
    fn accepts_capitalized_item_id() {
        let input = r#"{"items": [{"Id": 7, "name": "Olive", "price": 50}], "properties": {}}"#;
        let schema = parse_schema_str(input).unwrap();
        assert_eq!(schema.items[0].id, ItemId::from(7_u64));
        assert_eq!(schema.items[0].min_quantity, 0);
        assert_eq!(schema.items[0].max_quantity, None);
    }

    #[test]
    fn unknown_property_type_maps_to_other() {
        let input = r#"{"properties": {"note": {"type": "object"}}}"#;
        let schema = parse_schema_str(input).unwrap();
        assert_eq!(
            schema.properties.get("note").unwrap().kind,
            Some(PropertyType::Other)
        );
    }

    #[test]
    fn missing_items_defaults_to_empty_catalog() {
        let schema = parse_schema_str(r#"{"properties": {}}"#).unwrap();
        assert!(schema.items.is_empty());
        assert!(schema.properties.is_empty());
    }

    #[test]
    fn rejects_properties_that_are_not_a_map() {
        assert!(parse_schema_str(r#"{"properties": ["size"]}"#).is_err());
        assert!(parse_schema_str(r#"{"items": []}"#).is_err());
    }

    #[test]
    fn mistyped_metadata_names_the_property() {
        let err = parse_schema_str(r#"{"properties": {"size": {"minItems": -1}}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::ParseJson(_)));
        assert!(err.to_string().contains("property 'size'"), "{err}");

        let err =
            parse_schema_str(r#"{"properties": {"a": {}, "b": {"description": 5}}}"#).unwrap_err();
        assert!(err.to_string().contains("property 'b'"), "{err}");
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut properties: Properties = [("a", Property::default()), ("b", Property::default())]
            .into_iter()
            .collect();
        properties.insert(
            "a",
            Property {
                description: Some("again".to_owned()),
                ..Property::default()
            },
        );
        let keys: Vec<_> = properties.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(
            properties.get("a").unwrap().description.as_deref(),
            Some("again")
        );
    }

    #[test]
    fn item_quantity_bounds_are_inclusive() {
        let item = Item {
            id: ItemId::from("ham"),
            name: "Ham".to_owned(),
            price: Price::from_minor(300),
            image: None,
            min_quantity: 1,
            max_quantity: Some(3),
        };
        assert!(!item.accepts_quantity(0));
        assert!(item.accepts_quantity(1));
        assert!(item.accepts_quantity(3));
        assert!(!item.accepts_quantity(4));
    }

    #[test]
    fn parse_schema_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{"properties": {"size": {"type": "string"}}}"#).unwrap();
        let schema = parse_schema_file(&path).unwrap();
        assert_eq!(schema.properties.len(), 1);
    }

    #[test]
    fn parse_schema_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_schema_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }
}
