//! Identifier and money types shared by the schema, normalizer, and selection layers.
//!
//! Both serialize exactly as the JSON schema spells them: `ItemId` as a bare
//! string or number, `Price` as an integer count of minor currency units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw value from a property's `enum` list.
///
/// Candidates either name a catalog item by its identifier or stand on their own
/// as free-form choices.
pub type Candidate = serde_json::Value;

/// Opaque catalog identifier.
///
/// Matching against candidates is strict: a text id never equals a numeric
/// candidate and vice versa, even when they print the same. Numbers compare by
/// value, so `1`, `1.0` and `1e0` all name the same item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Text(String),
    Number(serde_json::Number),
}

impl ItemId {
    /// Return `true` if `candidate` is exactly this identifier.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        match (self, candidate) {
            (Self::Text(id), Candidate::String(value)) => id == value,
            (Self::Number(id), Candidate::Number(value)) => {
                NumberKey::of(id) == NumberKey::of(value)
            }
            _ => false,
        }
    }

    /// Build the identifier a candidate would match, if it can name an item at all.
    pub fn from_candidate(candidate: &Candidate) -> Option<Self> {
        match candidate {
            Candidate::String(value) => Some(Self::Text(value.clone())),
            Candidate::Number(value) => Some(Self::Number(value.clone())),
            _ => None,
        }
    }

    pub(crate) fn key(&self) -> IdKey {
        match self {
            Self::Text(id) => IdKey::Text(id.clone()),
            Self::Number(id) => IdKey::Number(NumberKey::of(id)),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(id) => f.write_str(id),
            Self::Number(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// Hashable form of an [`ItemId`] used by the catalog index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum IdKey {
    Text(String),
    Number(NumberKey),
}

/// Numeric value of a JSON number, independent of how it was spelled.
///
/// Integral values (including integral floats and `-0`) collapse to `Integer`;
/// everything else keeps its `f64` bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NumberKey {
    Integer(i128),
    Fraction(u64),
}

impl NumberKey {
    const INTEGER_LIMIT: f64 = 1.701_411_834_604_692_3e38; // 2^127

    pub(crate) fn of(number: &serde_json::Number) -> Self {
        if let Some(n) = number.as_u64() {
            return Self::Integer(i128::from(n));
        }
        if let Some(n) = number.as_i64() {
            return Self::Integer(i128::from(n));
        }
        let value = number.as_f64().unwrap_or(f64::NAN);
        if value.fract() == 0.0 && value.abs() < Self::INTEGER_LIMIT {
            #[allow(clippy::cast_possible_truncation)]
            let integer = value as i128;
            return Self::Integer(integer);
        }
        Self::Fraction(value.to_bits())
    }
}

/// Amount of money in minor currency units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Self = Self(0);

    pub const fn from_minor(units: i64) -> Self {
        Self(units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Price {
    fn from(units: i64) -> Self {
        Self(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_id_matches_only_equal_strings() {
        let id = ItemId::from("ham");
        assert!(id.matches(&json!("ham")));
        assert!(!id.matches(&json!("Ham")));
        assert!(!id.matches(&json!(null)));
    }

    #[test]
    fn ids_do_not_coerce_between_text_and_number() {
        assert!(!ItemId::from("1").matches(&json!(1)));
        assert!(!ItemId::from(1_u64).matches(&json!("1")));
        assert!(ItemId::from(1_u64).matches(&json!(1)));
    }

    #[test]
    fn item_id_deserializes_from_string_or_number() {
        let text: ItemId = serde_json::from_str("\"ham\"").unwrap();
        let num: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(text, ItemId::from("ham"));
        assert_eq!(num, ItemId::from(42_u64));
        assert_eq!(serde_json::to_string(&num).unwrap(), "42");
    }

    #[test]
    fn from_candidate_rejects_non_scalar_values() {
        assert_eq!(ItemId::from_candidate(&json!("x")), Some(ItemId::from("x")));
        assert_eq!(ItemId::from_candidate(&json!(true)), None);
        assert_eq!(ItemId::from_candidate(&json!({"id": 1})), None);
    }

    #[test]
    fn numbers_match_by_value_not_spelling() {
        let one = ItemId::from(1_u64);
        let float: Candidate = serde_json::from_str("1.0").unwrap();
        let exp: Candidate = serde_json::from_str("1e0").unwrap();
        assert!(one.matches(&float));
        assert!(one.matches(&exp));
        assert!(!one.matches(&json!("1")));
        assert!(!one.matches(&json!(1.5)));

        let zero = ItemId::from(0_u64);
        let negative_zero: Candidate = serde_json::from_str("-0").unwrap();
        assert!(zero.matches(&negative_zero));

        let float_id: ItemId = serde_json::from_str("1.0").unwrap();
        assert_eq!(one.key(), float_id.key());
        assert_ne!(one.key(), ItemId::from("1").key());
    }

    #[test]
    fn fractional_numbers_match_only_themselves() {
        let id: ItemId = serde_json::from_str("2.5").unwrap();
        assert!(id.matches(&json!(2.5)));
        assert!(!id.matches(&json!(2)));
        assert!(!id.matches(&json!(3)));
    }

    #[test]
    fn price_displays_major_units() {
        assert_eq!(Price::from_minor(1250).to_string(), "12.50");
        assert_eq!(Price::from_minor(5).to_string(), "0.05");
        assert_eq!(Price::from_minor(-199).to_string(), "-1.99");
        assert_eq!(Price::ZERO.to_string(), "0.00");
    }

    #[test]
    fn price_checked_arithmetic() {
        let p = Price::from_minor(300);
        assert_eq!(p.checked_mul(3), Some(Price::from_minor(900)));
        assert_eq!(p.checked_add(Price::from_minor(50)), Some(Price::from_minor(350)));
        assert_eq!(Price::from_minor(i64::MAX).checked_mul(2), None);
    }
}
