pub mod bag;
pub mod dense;
pub mod sort;
pub mod tree;

pub use bag::TransactionBag;
pub use tree::{TransactionTree, TreeNode};

/// Transaction weights and itemset supports.
pub type Support = u64;

/// A sorted, duplicate free list of item identifiers with a weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub items: Vec<usize>,
    pub weight: Support,
}

impl Transaction {
    /// Creates a transaction, sorting and deduplicating `items`.
    pub fn new(mut items: Vec<usize>, weight: Support) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items, weight }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_all(&self, itemset: &[usize]) -> bool {
        itemset.iter().all(|item| self.items.binary_search(item).is_ok())
    }
}
