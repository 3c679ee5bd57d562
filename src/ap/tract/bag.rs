use std::cmp::Ordering;

use super::sort::heapsort_by;
use super::{Support, Transaction};

/// Direction of the transaction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A multiset of transactions with aggregate statistics.
#[derive(Debug, Clone, Default)]
pub struct TransactionBag {
    transactions: Vec<Transaction>,
    max_len: usize,
    total_weight: Support,
}

impl TransactionBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transaction with the given items and weight.
    pub fn add(&mut self, items: Vec<usize>, weight: Support) {
        self.push(Transaction::new(items, weight));
    }

    /// Adds an already sorted transaction.
    pub fn push(&mut self, transaction: Transaction) {
        self.max_len = self.max_len.max(transaction.len());
        self.total_weight += transaction.weight;
        self.transactions.push(transaction);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn total_weight(&self) -> Support {
        self.total_weight
    }

    /// Length of the longest transaction.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn get(&self, index: usize) -> &Transaction {
        &self.transactions[index]
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Maps every item through `map`, dropping items mapped to `None`,
    /// and restores the item order inside each transaction.
    pub fn recode(&mut self, map: &[Option<usize>]) {
        self.max_len = 0;
        for transaction in &mut self.transactions {
            transaction.items = transaction
                .items
                .iter()
                .filter_map(|&item| map.get(item).copied().flatten())
                .collect();
            transaction.items.sort_unstable();
            self.max_len = self.max_len.max(transaction.items.len());
        }
    }

    /// Removes unmarked items and empties transactions shorter than
    /// `min_len`. Emptied transactions keep their weight.
    pub fn filter(&mut self, min_len: usize, marks: Option<&[bool]>) {
        self.max_len = 0;
        for transaction in &mut self.transactions {
            if let Some(marks) = marks {
                transaction
                    .items
                    .retain(|&item| marks.get(item).copied().unwrap_or(false));
            }
            if transaction.items.len() < min_len {
                transaction.items.clear();
            }
            self.max_len = self.max_len.max(transaction.items.len());
        }
    }

    /// Sorts the items inside every transaction.
    pub fn sort_items(&mut self) {
        for transaction in &mut self.transactions {
            transaction.items.sort_unstable();
        }
    }

    /// Sorts the transactions lexicographically by their item sequence.
    /// A proper prefix sorts before its extensions.
    pub fn sort(&mut self, direction: SortDirection, heap: bool) {
        let compare = |a: &Transaction, b: &Transaction| -> Ordering {
            match direction {
                SortDirection::Ascending => a.items.cmp(&b.items),
                SortDirection::Descending => b.items.cmp(&a.items),
            }
        };
        if heap {
            heapsort_by(&mut self.transactions, compare);
        } else {
            self.transactions.sort_unstable_by(compare);
        }
    }

    /// Merges adjacent equal transactions by summing their weights and drops
    /// transactions with zero weight. The bag must be sorted.
    ///
    /// Returns the new number of transactions.
    pub fn reduce(&mut self) -> usize {
        let mut reduced: Vec<Transaction> = Vec::with_capacity(self.transactions.len());
        for transaction in self.transactions.drain(..) {
            if transaction.weight == 0 {
                continue;
            }
            match reduced.last_mut() {
                Some(last) if last.items == transaction.items => last.weight += transaction.weight,
                _ => reduced.push(transaction),
            }
        }
        self.transactions = reduced;
        self.transactions.len()
    }

    /// Total weight of the transactions starting with `prefix`.
    /// The bag must be sorted in ascending order.
    pub fn occurrences(&self, prefix: &[usize]) -> Support {
        let start = self
            .transactions
            .partition_point(|t| t.items.as_slice() < prefix);
        let range = &self.transactions[start..];
        let end = range.partition_point(|t| t.items.starts_with(prefix));
        range[..end].iter().map(|t| t.weight).sum()
    }

    /// Brute-force support of an itemset (sum of weights of supersets).
    pub fn support_of(&self, itemset: &[usize]) -> Support {
        self.transactions
            .iter()
            .filter(|t| t.contains_all(itemset))
            .map(|t| t.weight)
            .sum()
    }
}
