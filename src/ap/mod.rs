pub mod config;
pub mod error;
pub mod istree;
pub mod items;
pub mod memory;
pub mod miner;
pub mod report;
pub mod tract;
pub mod utils;


use ndarray::ArrayView2;

pub use config::{InputConfig, MinerConfig, Target, Thresholds};
pub use error::{AprioriError, Result};
pub use istree::{
    Aggregation, AssociationRule, FoundItemset, ItemsetTree, MarkTarget, Measure, RuleSupport,
    TreeParams,
};
pub use items::{Appearance, ItemBase, ItemOrder};
pub use memory::MemoryBudget;
pub use miner::{MinedTree, Miner, MiningSummary};
pub use report::ItemsetReporter;
pub use tract::{Support, Transaction, TransactionBag, TransactionTree};
pub use utils::{FrequentLevel, ItemsetStorage};

/// Frequent itemsets of a 0/1 matrix grouped by size, with items given
/// as column indices.
pub fn apriori_dense(transactions: ArrayView2<i32>, config: &MinerConfig) -> Result<Vec<FrequentLevel>> {
    let (base, bag) = tract::dense::matrix_to_bag(transactions);
    let mined = Miner::new(config.clone())?.mine(base, bag)?;
    let mut levels = Vec::new();
    let mut items = Vec::new();
    for level in mined.frequent_levels() {
        let mut remapped = FrequentLevel::new(level.itemset_size);
        for idx in 0..level.len() {
            items.clear();
            items.extend(
                level
                    .get_itemset(idx)
                    .iter()
                    .map(|&id| tract::dense::column_of(&mined.base, id)),
            );
            items.sort_unstable();
            remapped.add_itemset(&items, level.support(idx), level.value(idx));
        }
        levels.push(remapped);
    }
    Ok(levels)
}

/// Association rules of a 0/1 matrix with items given as column indices.
pub fn rules_dense(transactions: ArrayView2<i32>, config: &MinerConfig) -> Result<Vec<AssociationRule>> {
    let (base, bag) = tract::dense::matrix_to_bag(transactions);
    let mut config = config.clone();
    config.target = Target::Rules;
    let mined = Miner::new(config)?.mine(base, bag)?;
    let column = |id| tract::dense::column_of(&mined.base, id);
    Ok(mined
        .rules()
        .map(|mut rule| {
            rule.head = column(rule.head);
            rule.body = rule.body.iter().map(|&id| column(id)).collect();
            rule.body.sort_unstable();
            rule
        })
        .collect())
}
