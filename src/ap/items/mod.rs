pub mod reader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::error::{AprioriError, Result};
use super::tract::{Support, Transaction};

pub use reader::read_transactions;

/// Role an item may play in an association rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    /// Never part of a reported set or rule
    Ignore,
    /// Antecedent only
    Body,
    /// Consequent only
    Head,
    #[default]
    Both,
}

impl Appearance {
    pub fn in_body(self) -> bool {
        matches!(self, Appearance::Body | Appearance::Both)
    }

    pub fn in_head(self) -> bool {
        matches!(self, Appearance::Head | Appearance::Both)
    }
}

impl FromStr for Appearance {
    type Err = AprioriError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "-" | "none" | "neither" | "ignore" => Ok(Appearance::Ignore),
            "i" | "in" | "a" | "antecedent" | "b" | "body" => Ok(Appearance::Body),
            "o" | "out" | "c" | "consequent" | "h" | "head" => Ok(Appearance::Head),
            "io" | "inout" | "ac" | "a&c" | "both" | "bh" | "b&h" => Ok(Appearance::Both),
            other => Err(AprioriError::InvalidAppearance(other.to_string())),
        }
    }
}

/// Order of item identifiers after recoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOrder {
    DescendingExtended,
    Descending,
    Identifier,
    Ascending,
    #[default]
    AscendingExtended,
}

impl ItemOrder {
    /// Classic numeric code: -2, -1, 0, 1, 2.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            -2 => Ok(ItemOrder::DescendingExtended),
            -1 => Ok(ItemOrder::Descending),
            0 => Ok(ItemOrder::Identifier),
            1 => Ok(ItemOrder::Ascending),
            2 => Ok(ItemOrder::AscendingExtended),
            other => Err(AprioriError::InvalidItemOrder(other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemInfo {
    pub name: String,
    pub frequency: Support,
    /// Sum of the sizes of all transactions containing the item
    pub extended_frequency: Support,
    pub appearance: Appearance,
    pub penalty: f64,
}

/// Name to identifier mapping with per-item statistics.
#[derive(Debug, Clone, Default)]
pub struct ItemBase {
    items: Vec<ItemInfo>,
    ids: HashMap<String, usize>,
    total_weight: Support,
    default_appearance: Appearance,
    default_penalty: f64,
}

impl ItemBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item base with items named `0..count`, as used for dense matrices.
    pub fn with_columns(count: usize) -> Self {
        let mut base = Self::new();
        for column in 0..count {
            base.get_or_insert(&column.to_string());
        }
        base
    }

    pub fn set_default_appearance(&mut self, appearance: Appearance) {
        self.default_appearance = appearance;
    }

    pub fn set_default_penalty(&mut self, penalty: f64) {
        self.default_penalty = penalty;
    }

    /// Adds a new item, failing if the name is already known.
    pub fn add(&mut self, name: &str) -> Result<usize> {
        if self.ids.contains_key(name) {
            return Err(AprioriError::DuplicateItem(name.to_string()));
        }
        Ok(self.get_or_insert(name))
    }

    pub fn get_or_insert(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.items.len();
        self.items.push(ItemInfo {
            name: name.to_string(),
            frequency: 0,
            extended_frequency: 0,
            appearance: self.default_appearance,
            penalty: self.default_penalty,
        });
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: usize) -> &str {
        &self.items[id].name
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_weight(&self) -> Support {
        self.total_weight
    }

    pub fn info(&self, id: usize) -> &ItemInfo {
        &self.items[id]
    }

    pub fn frequency(&self, id: usize) -> Support {
        self.items[id].frequency
    }

    pub fn extended_frequency(&self, id: usize) -> Support {
        self.items[id].extended_frequency
    }

    pub fn appearance(&self, id: usize) -> Appearance {
        self.items[id].appearance
    }

    pub fn set_appearance(&mut self, id: usize, appearance: Appearance) {
        self.items[id].appearance = appearance;
    }

    pub fn set_penalty(&mut self, id: usize, penalty: f64) {
        self.items[id].penalty = penalty;
    }

    pub fn appearances(&self) -> Vec<Appearance> {
        self.items.iter().map(|item| item.appearance).collect()
    }

    pub fn frequencies(&self) -> Vec<Support> {
        self.items.iter().map(|item| item.frequency).collect()
    }

    /// Registers one record and returns it as a transaction.
    ///
    /// Item names are mapped to identifiers (new names are added), duplicates
    /// are removed and the item frequencies are updated with `weight`.
    pub fn register<S: AsRef<str>>(&mut self, names: &[S], weight: Support) -> Transaction {
        let mut ids: Vec<usize> = names
            .iter()
            .map(|name| self.get_or_insert(name.as_ref()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        self.count(&ids, weight);
        Transaction::new(ids, weight)
    }

    /// Updates the item statistics for an already-coded transaction.
    pub fn count(&mut self, ids: &[usize], weight: Support) {
        let size = ids.len() as Support;
        for &id in ids {
            let item = &mut self.items[id];
            item.frequency += weight;
            item.extended_frequency += weight * size;
        }
        self.total_weight += weight;
    }

    /// Adds the insertion penalty of every item to its frequency.
    pub fn apply_penalties(&mut self) {
        let total = self.total_weight as f64;
        for item in &mut self.items {
            if item.penalty > 0.0 {
                item.frequency += (item.penalty * total).ceil() as Support;
            }
        }
    }

    /// Sorts the items by `order`, drops ignored items and items with a
    /// frequency below `min_frequency`, and renumbers the rest.
    ///
    /// Returns the map from old to new identifiers.
    pub fn recode(&mut self, min_frequency: Support, order: ItemOrder) -> Vec<Option<usize>> {
        let keep = |item: &ItemInfo| {
            item.appearance != Appearance::Ignore && item.frequency >= min_frequency
        };
        let mut order_ids: Vec<usize> = (0..self.items.len()).collect();
        let items = &self.items;
        order_ids.sort_by(|&a, &b| {
            let (x, y) = (&items[a], &items[b]);
            keep(y).cmp(&keep(x)).then_with(|| match order {
                ItemOrder::AscendingExtended => x
                    .extended_frequency
                    .cmp(&y.extended_frequency)
                    .then(x.frequency.cmp(&y.frequency)),
                ItemOrder::Ascending => x.frequency.cmp(&y.frequency),
                ItemOrder::Identifier => std::cmp::Ordering::Equal,
                ItemOrder::Descending => y.frequency.cmp(&x.frequency),
                ItemOrder::DescendingExtended => y
                    .extended_frequency
                    .cmp(&x.extended_frequency)
                    .then(y.frequency.cmp(&x.frequency)),
            })
            .then(a.cmp(&b))
        });

        let mut map = vec![None; self.items.len()];
        let mut old = std::mem::take(&mut self.items).into_iter().map(Some).collect::<Vec<_>>();
        self.ids.clear();
        for old_id in order_ids {
            let Some(item) = old[old_id].take() else { continue };
            if !keep(&item) {
                continue;
            }
            let new_id = self.items.len();
            map[old_id] = Some(new_id);
            self.ids.insert(item.name.clone(), new_id);
            self.items.push(item);
        }
        map
    }
}
