use std::io::{Read, Write};
use std::time::Instant;

use tracing::{debug, info};

use super::config::{MinerConfig, Target};
use super::error::{AprioriError, Result};
use super::istree::{ItemsetTree, MarkTarget, Measure, RuleCursor, RuleSupport, TreeParams};
use super::items::{read_transactions, ItemBase};
use super::memory::MemoryBudget;
use super::report::{ItemsetReporter, ReportEvaluation};
use super::tract::bag::SortDirection;
use super::tract::{Support, TransactionBag, TransactionTree};
use super::utils::FrequentLevel;

/// Counts of one mining run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiningSummary {
    /// Frequent items after recoding
    pub items: usize,
    /// Distinct transactions after reduction
    pub transactions: usize,
    /// Height of the finished itemset tree
    pub levels: usize,
    pub nodes: usize,
    /// Itemsets or rules written
    pub written: usize,
}

/// A finished itemset tree together with the size range it was grown for.
#[derive(Debug, Clone)]
pub struct MinedTree {
    pub tree: ItemsetTree,
    pub base: ItemBase,
    pub min_size: usize,
    pub max_size: usize,
    pub transactions: usize,
}

impl MinedTree {
    pub fn frequent_levels(&self) -> Vec<FrequentLevel> {
        self.tree.frequent_levels(self.min_size, self.max_size)
    }

    pub fn rules(&self) -> RuleCursor<'_> {
        self.tree.rules(self.min_size, self.max_size, true)
    }
}

/// Level-wise Apriori driver.
pub struct Miner {
    config: MinerConfig,
}

impl Miner {
    pub fn new(config: MinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Reads transactions from `input` and writes the result to `out`.
    pub fn run_reader<R: Read, W: Write>(&self, input: R, out: W) -> Result<MiningSummary> {
        let start = Instant::now();
        let mut base = ItemBase::new();
        self.config.apply_appearances(&mut base);
        let bag = read_transactions(input, &self.config.input, &mut base)?;
        info!(
            items = base.len(),
            transactions = bag.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "read transactions"
        );
        self.run(base, bag, out)
    }

    /// Mines `bag` and writes the itemsets or rules to `out`.
    pub fn run<W: Write>(&self, base: ItemBase, bag: TransactionBag, out: W) -> Result<MiningSummary> {
        let perfect = self.config.effective_perfect_extensions();
        let mined = self.grow(base, bag, perfect)?;
        let start = Instant::now();
        let written = self.write(&mined, out)?;
        info!(
            written,
            target = self.config.target.noun(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "wrote result"
        );
        Ok(MiningSummary {
            items: mined.base.len(),
            transactions: mined.transactions,
            levels: mined.tree.height(),
            nodes: mined.tree.node_count(),
            written,
        })
    }

    /// Builds and counts the itemset tree without writing any output.
    ///
    /// Perfect extensions are kept as explicit tree nodes, so the cursors
    /// of the result see every qualifying itemset.
    pub fn mine(&self, base: ItemBase, bag: TransactionBag) -> Result<MinedTree> {
        self.grow(base, bag, false)
    }

    fn grow(&self, mut base: ItemBase, mut bag: TransactionBag, perfect: bool) -> Result<MinedTree> {
        let config = &self.config;
        let weight = bag.total_weight();
        if bag.is_empty() || weight == 0 {
            return Err(AprioriError::NoTransactions);
        }
        let thresholds = config.thresholds(weight);
        let (confidence, rule_support) = config.effective_rule_params();

        let start = Instant::now();
        base.apply_penalties();
        let min_frequency = match rule_support {
            RuleSupport::Both => thresholds.min_support,
            RuleSupport::Body => (thresholds.min_support as f64 * confidence).ceil() as Support,
        };
        let map = base.recode(min_frequency, config.item_order);
        bag.recode(&map);
        info!(
            items = base.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "recoded items"
        );
        if base.is_empty() {
            return Err(AprioriError::NoFrequentItems);
        }
        let max_size = config.max_size.unwrap_or(usize::MAX).min(bag.max_len());

        let start = Instant::now();
        bag.filter(config.min_size, None);
        bag.sort(SortDirection::Ascending, config.heap_sort);
        let transactions = bag.reduce();
        info!(
            transactions,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "reduced transactions"
        );

        let mut tract_tree = None;
        let mut tree_time = 0.0;
        if config.use_tree {
            let start = Instant::now();
            let built = TransactionTree::build(&bag);
            tree_time = start.elapsed().as_secs_f64();
            info!(
                nodes = built.node_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "built transaction tree"
            );
            tract_tree = Some(built);
        }

        let params = TreeParams {
            min_support: thresholds.min_support,
            max_support: thresholds.max_support,
            min_confidence: confidence,
            rule_support,
            perfect_extensions: perfect,
        };
        let budget = config
            .memory_limit
            .map_or_else(MemoryBudget::unlimited, MemoryBudget::new);
        let mut tree = ItemsetTree::new(&base, &params).with_budget(budget);
        tree.set_evaluation(
            config.measure,
            config.aggregation,
            config.min_value,
            config.prune_from(),
        );

        let start = Instant::now();
        let filter = config.effective_filter();
        let mut marks = Vec::new();
        let mut live = base.len();
        let mut count_time = 0.0;
        loop {
            let size = tree.height();
            if size >= max_size {
                break;
            }
            let used = if filter != 0.0 {
                let used = tree.check_usage(&mut marks);
                if used <= size {
                    break;
                }
                used
            } else {
                live
            };
            if config.prune_counters {
                tree.prune();
            }
            if !tree.add_level()? {
                break;
            }
            let refresh = (filter < 0.0 && (used as f64) < -filter * live as f64)
                || (filter > 0.0
                    && used < live
                    && used as f64 * tree_time < filter * live as f64 * count_time);
            if refresh {
                live = used;
                let refresh_start = Instant::now();
                bag.filter(size + 1, Some(&marks));
                bag.sort(SortDirection::Ascending, config.heap_sort);
                bag.reduce();
                if let Some(existing) = tract_tree.as_mut() {
                    *existing = TransactionTree::build(&bag);
                }
                tree_time = refresh_start.elapsed().as_secs_f64();
                debug!(
                    items = used,
                    transactions = bag.len(),
                    "refreshed transactions"
                );
            }
            let count_start = Instant::now();
            match &tract_tree {
                Some(tract_tree) => tree.count_tree(tract_tree),
                None => tree.count_bag(&bag),
            }
            count_time = count_start.elapsed().as_secs_f64();
            info!(
                level = tree.height(),
                nodes = tree.node_count(),
                elapsed_ms = count_start.elapsed().as_millis() as u64,
                "counted candidates"
            );
        }
        info!(
            levels = tree.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "checked subsets"
        );

        let mark = match config.target {
            Target::Closed => Some(MarkTarget::Closed),
            Target::Maximal => Some(MarkTarget::Maximal),
            _ => None,
        };
        if let Some(mark) = mark {
            let start = Instant::now();
            tree.mark(mark, config.prune_level < 0);
            info!(
                target = ?mark,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "filtered itemsets"
            );
        }

        Ok(MinedTree {
            tree,
            base,
            min_size: config.min_size,
            max_size,
            transactions,
        })
    }

    /// Writes the itemsets or rules of a mined tree.
    pub fn write<W: Write>(&self, mined: &MinedTree, out: W) -> Result<usize> {
        let config = &self.config;
        let mut reporter = ItemsetReporter::new(&mined.base, out);
        reporter.set_format(&config.output_format());
        reporter.set_separator(&config.item_separator);
        reporter.set_implication(&config.implication);
        reporter.set_size(mined.min_size, mined.max_size);
        reporter.set_closed(config.closed_or_maximal());

        let ascending = config.direction >= 0;
        let written = if config.is_set_target() && config.direction == 0 {
            let evaluation = match config.measure {
                Measure::None => ReportEvaluation::None,
                Measure::LogQuotient => ReportEvaluation::LogQuotient,
                _ => ReportEvaluation::External,
            };
            reporter.set_evaluation(evaluation, config.min_value);
            mined.tree.report(&mut reporter)?
        } else if config.is_set_target() {
            for set in mined.tree.itemsets(mined.min_size, mined.max_size, ascending) {
                reporter.write_set(&set.items, set.support, set.value)?;
            }
            reporter.written()
        } else {
            for rule in mined.tree.rules(mined.min_size, mined.max_size, ascending) {
                reporter.write_rule(&rule)?;
            }
            reporter.written()
        };
        reporter.flush()?;
        Ok(written)
    }
}
