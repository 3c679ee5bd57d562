use ndarray::ArrayView2;

use super::{Transaction, TransactionBag};
use crate::ap::items::ItemBase;

/// Builds a bag from a 0/1 matrix, one row per transaction and one column
/// per item. Item `j` is named by its column index.
pub fn matrix_to_bag(transactions: ArrayView2<i32>) -> (ItemBase, TransactionBag) {
    let num_transactions = transactions.shape()[0];
    let num_items = transactions.shape()[1];

    let mut base = ItemBase::with_columns(num_items);
    let mut bag = TransactionBag::new();
    for i in 0..num_transactions {
        let items: Vec<usize> = (0..num_items)
            .filter(|&j| transactions[[i, j]] != 0)
            .collect();
        base.count(&items, 1);
        bag.push(Transaction { items, weight: 1 });
    }
    (base, bag)
}

/// Column index of a recoded item of a base built by [`matrix_to_bag`].
pub fn column_of(base: &ItemBase, id: usize) -> usize {
    base.name(id).parse().unwrap_or(id)
}

impl TransactionBag {
    /// Bag of a 0/1 matrix; see [`matrix_to_bag`].
    pub fn from_dense(transactions: ArrayView2<i32>) -> (ItemBase, TransactionBag) {
        matrix_to_bag(transactions)
    }
}
