//! Selection state over normalized options.
//!
//! `Selection` owns the quantity chosen for every entry of every option and
//! derives the order total and the "all required options satisfied" flag.
//! Observers are notified only after the new quantity has been stored, so a
//! listener reading the selection from inside the callback sees the update.

use crate::normalize::{NormalizedOption, OptionEntry};
use crate::types::{ItemId, Price};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '{option}' has no entry {entry}")]
    UnknownEntry { option: String, entry: usize },
    #[error("option '{option}' has no choice '{key}'")]
    UnknownChoice { option: String, key: String },
    #[error("quantity {quantity} for '{label}' in option '{option}' is outside {min}..={max}")]
    QuantityOutOfRange {
        option: String,
        label: String,
        quantity: u32,
        min: u32,
        max: String,
    },
    #[error("option '{option}' allows at most {max} items, {requested} requested")]
    TooManyItems {
        option: String,
        max: u32,
        requested: u32,
    },
    #[error("option '{option}' requires unique items, '{label}' can be chosen at most once")]
    DuplicateChoice { option: String, label: String },
    #[error("order total overflows")]
    PriceOverflow,
    #[error("item count for option '{option}' overflows")]
    QuantityOverflow { option: String },
}

/// Emitted after every successful quantity update.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub option: String,
    pub entry: usize,
    pub value: OptionEntry,
    pub quantity: u32,
    pub total: Price,
    pub satisfied: bool,
}

pub trait SelectionObserver {
    fn selection_changed(&self, change: &SelectionChange);
}

impl<F> SelectionObserver for F
where
    F: Fn(&SelectionChange),
{
    fn selection_changed(&self, change: &SelectionChange) {
        self(change);
    }
}

pub struct Selection {
    options: Vec<NormalizedOption>,
    quantities: Vec<Vec<u32>>,
    observers: Vec<Box<dyn SelectionObserver>>,
}

impl Selection {
    pub fn new(options: Vec<NormalizedOption>) -> Self {
        let quantities = options.iter().map(|o| vec![0; o.entries().len()]).collect();
        Self {
            options,
            quantities,
            observers: Vec::new(),
        }
    }

    pub fn options(&self) -> &[NormalizedOption] {
        &self.options
    }

    pub fn subscribe(&mut self, observer: Box<dyn SelectionObserver>) {
        self.observers.push(observer);
    }

    /// Set the quantity of one entry. Zero always clears the entry, regardless
    /// of the item's minimum.
    pub fn set_quantity(
        &mut self,
        option: &str,
        entry: usize,
        quantity: u32,
    ) -> Result<SelectionChange, SelectionError> {
        let opt_idx = self.option_index(option)?;
        let normalized = &self.options[opt_idx];
        let Some(value) = normalized.entries().get(entry) else {
            return Err(SelectionError::UnknownEntry {
                option: option.to_owned(),
                entry,
            });
        };

        if quantity > 0 {
            if let Some(item) = value.as_item() {
                if !item.accepts_quantity(quantity) {
                    return Err(SelectionError::QuantityOutOfRange {
                        option: option.to_owned(),
                        label: item.name.clone(),
                        quantity,
                        min: item.min_quantity,
                        max: item
                            .max_quantity
                            .map_or_else(|| "unbounded".to_owned(), |m| m.to_string()),
                    });
                }
            }
            if normalized.unique_items == Some(true) && quantity > 1 {
                return Err(SelectionError::DuplicateChoice {
                    option: option.to_owned(),
                    label: value.label(),
                });
            }
        }

        let previous = self.quantities[opt_idx][entry];
        let requested = (self.option_quantity_at(opt_idx) - previous)
            .checked_add(quantity)
            .ok_or_else(|| SelectionError::QuantityOverflow {
                option: option.to_owned(),
            })?;
        if let Some(max) = normalized.max_items {
            if requested > max {
                return Err(SelectionError::TooManyItems {
                    option: option.to_owned(),
                    max,
                    requested,
                });
            }
        }

        let value = value.clone();
        self.quantities[opt_idx][entry] = quantity;
        let total = match self.total() {
            Ok(total) => total,
            Err(e) => {
                self.quantities[opt_idx][entry] = previous;
                return Err(e);
            }
        };

        let change = SelectionChange {
            option: option.to_owned(),
            entry,
            value,
            quantity,
            total,
            satisfied: self.is_satisfied(),
        };
        debug!(
            "selection '{option}'[{entry}] = {quantity}, total {total}, satisfied={}",
            change.satisfied
        );
        for observer in &self.observers {
            observer.selection_changed(&change);
        }
        Ok(change)
    }

    /// Set the quantity of the entry holding catalog item `id`.
    pub fn set_quantity_by_id(
        &mut self,
        option: &str,
        id: &ItemId,
        quantity: u32,
    ) -> Result<SelectionChange, SelectionError> {
        let opt_idx = self.option_index(option)?;
        let entry = self.options[opt_idx]
            .entries()
            .iter()
            .position(|e| e.as_item().is_some_and(|item| item.id.key() == id.key()))
            .ok_or_else(|| SelectionError::UnknownChoice {
                option: option.to_owned(),
                key: id.to_string(),
            })?;
        self.set_quantity(option, entry, quantity)
    }

    /// Set the quantity of the entry whose item id or raw value prints as `key`.
    pub fn set_quantity_by_key(
        &mut self,
        option: &str,
        key: &str,
        quantity: u32,
    ) -> Result<SelectionChange, SelectionError> {
        let entry = self.find_entry(option, key)?;
        self.set_quantity(option, entry, quantity)
    }

    pub fn find_entry(&self, option: &str, key: &str) -> Result<usize, SelectionError> {
        let opt_idx = self.option_index(option)?;
        self.options[opt_idx]
            .entries()
            .iter()
            .position(|e| entry_key(e) == key)
            .ok_or_else(|| SelectionError::UnknownChoice {
                option: option.to_owned(),
                key: key.to_owned(),
            })
    }

    pub fn quantity(&self, option: &str, entry: usize) -> Option<u32> {
        let opt_idx = self.option_index(option).ok()?;
        self.quantities[opt_idx].get(entry).copied()
    }

    pub fn option_quantity(&self, option: &str) -> Option<u32> {
        let opt_idx = self.option_index(option).ok()?;
        Some(self.option_quantity_at(opt_idx))
    }

    /// Sum of price times quantity over every chosen catalog item.
    /// Raw entries carry no price and contribute nothing.
    pub fn total(&self) -> Result<Price, SelectionError> {
        let mut total = Price::ZERO;
        for (option, quantities) in self.options.iter().zip(&self.quantities) {
            for (entry, &quantity) in option.entries().iter().zip(quantities) {
                let Some(item) = entry.as_item() else {
                    continue;
                };
                let line = item
                    .price
                    .checked_mul(quantity)
                    .ok_or(SelectionError::PriceOverflow)?;
                total = total
                    .checked_add(line)
                    .ok_or(SelectionError::PriceOverflow)?;
            }
        }
        Ok(total)
    }

    /// Every required option has at least `max(minItems, 1)` items, and every
    /// other option that was touched meets its `minItems`.
    pub fn is_satisfied(&self) -> bool {
        self.options.iter().enumerate().all(|(idx, option)| {
            let chosen = self.option_quantity_at(idx);
            let min = option.min_items.unwrap_or(0);
            if option.is_required() {
                chosen >= min.max(1)
            } else {
                chosen == 0 || chosen >= min
            }
        })
    }

    /// `true` once anything has been chosen.
    pub fn has_selection(&self) -> bool {
        self.quantities.iter().flatten().any(|&q| q > 0)
    }

    /// Clear every quantity. Observers are not notified.
    pub fn reset(&mut self) {
        for quantities in &mut self.quantities {
            quantities.iter_mut().for_each(|q| *q = 0);
        }
    }

    fn option_index(&self, option: &str) -> Result<usize, SelectionError> {
        self.options
            .iter()
            .position(|o| o.option == option)
            .ok_or_else(|| SelectionError::UnknownOption(option.to_owned()))
    }

    /// Stored quantities of one option always sum within `u32`; `set_quantity`
    /// rejects any update that would not.
    fn option_quantity_at(&self, idx: usize) -> u32 {
        self.quantities[idx]
            .iter()
            .fold(0_u32, |sum, &q| sum.saturating_add(q))
    }
}

fn entry_key(entry: &OptionEntry) -> String {
    match entry {
        OptionEntry::Item(item) => item.id.to_string(),
        OptionEntry::Raw(_) => entry.label(),
    }
}
