//! Itemset and rule output.
//!
//! The reporter keeps the current itemset as a stack of items. Text for a
//! common prefix of consecutive itemsets is formatted once and reused, and
//! perfect extensions collected on the way are expanded into all their
//! combinations when a set is reported.

pub mod format;

use std::f64::consts::LN_2;
use std::io::Write;

use tracing::trace;

use crate::ap::error::{AprioriError, Result};
use crate::ap::istree::AssociationRule;
use crate::ap::items::ItemBase;
use crate::ap::tract::Support;

pub use format::{OutputFormat, Quantities};

pub const DEFAULT_ITEM_SEPARATOR: &str = " ";
pub const DEFAULT_IMPLICATION: &str = " <- ";

/// Source of the evaluation value printed with `%e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportEvaluation {
    #[default]
    None,
    /// Computed by the reporter from the item frequencies
    LogQuotient,
    /// Supplied by the caller of [`ItemsetReporter::report`]
    External,
}

pub struct ItemsetReporter<W: Write> {
    out: W,
    names: Vec<String>,
    separator: String,
    implication: String,
    format: OutputFormat,
    min_size: usize,
    max_size: usize,
    /// Only report the largest sets formed with the perfect extensions
    closed: bool,
    items: Vec<usize>,
    /// `supports[k]` is the support of the first `k` items
    supports: Vec<Support>,
    used: Vec<bool>,
    pex: Vec<usize>,
    /// Number of perfect extensions added per set size
    pex_counts: Vec<usize>,
    buffer: String,
    /// `positions[k]` is the end of the text for the first `k` items
    positions: Vec<usize>,
    /// Number of items whose text in `buffer` is valid
    prefix: usize,
    evaluation: ReportEvaluation,
    min_value: f64,
    logs: Vec<f64>,
    log_weight: f64,
    sums: Vec<f64>,
    info: String,
    written: usize,
}

impl<W: Write> ItemsetReporter<W> {
    pub fn new(base: &ItemBase, out: W) -> Self {
        let names: Vec<String> = (0..base.len()).map(|id| base.name(id).to_string()).collect();
        let n = names.len();
        let logs = base
            .frequencies()
            .iter()
            .map(|&freq| (freq.max(1) as f64).ln())
            .collect();
        Self {
            out,
            names,
            separator: DEFAULT_ITEM_SEPARATOR.to_string(),
            implication: DEFAULT_IMPLICATION.to_string(),
            format: OutputFormat::default(),
            min_size: 1,
            max_size: usize::MAX,
            closed: false,
            items: Vec::with_capacity(n),
            supports: vec![base.total_weight()],
            used: vec![false; n],
            pex: Vec::new(),
            pex_counts: vec![0],
            buffer: String::new(),
            positions: vec![0; n + 1],
            prefix: 0,
            evaluation: ReportEvaluation::None,
            min_value: f64::NEG_INFINITY,
            logs,
            log_weight: (base.total_weight().max(1) as f64).ln(),
            sums: vec![0.0; n + 1],
            info: String::new(),
            written: 0,
        }
    }

    pub fn set_size(&mut self, min: usize, max: usize) {
        self.min_size = min;
        self.max_size = max;
    }

    pub fn set_format(&mut self, format: &str) {
        self.format = OutputFormat::parse(format);
    }

    pub fn set_separator(&mut self, separator: &str) {
        self.separator = separator.to_string();
        self.prefix = 0;
    }

    pub fn set_implication(&mut self, implication: &str) {
        self.implication = implication.to_string();
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn set_evaluation(&mut self, evaluation: ReportEvaluation, min_value: f64) {
        self.evaluation = evaluation;
        self.min_value = min_value;
    }

    /// Number of items in the current set.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[usize] {
        &self.items
    }

    pub fn uses(&self, item: usize) -> bool {
        self.used.get(item).copied().unwrap_or(false)
    }

    /// Lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Appends an item to the current set. Returns `false` if the item is
    /// already part of the set or its perfect extensions.
    pub fn add(&mut self, item: usize, support: Support) -> bool {
        if self.uses(item) {
            return false;
        }
        self.used[item] = true;
        self.items.push(item);
        self.supports.push(support);
        self.pex_counts.push(0);
        true
    }

    /// Registers a perfect extension of the current set.
    pub fn add_perfect_extension(&mut self, item: usize) -> bool {
        if self.uses(item) {
            return false;
        }
        self.used[item] = true;
        self.pex.push(item);
        if let Some(count) = self.pex_counts.last_mut() {
            *count += 1;
        }
        true
    }

    /// Removes the last `n` items together with their perfect extensions.
    pub fn remove(&mut self, n: usize) {
        for _ in 0..n {
            let Some(item) = self.items.pop() else {
                break;
            };
            let count = self.pex_counts.pop().unwrap_or(0);
            for _ in 0..count {
                if let Some(pex) = self.pex.pop() {
                    self.used[pex] = false;
                }
            }
            self.supports.pop();
            self.used[item] = false;
        }
        self.prefix = self.prefix.min(self.items.len());
    }

    /// Reports the current set and all sets formed by adding perfect
    /// extensions. Returns the number of sets written.
    pub fn report(&mut self, value: f64) -> Result<usize> {
        let count = self.items.len();
        if count > self.max_size {
            return Ok(0);
        }
        let extensions = self.pex.len();
        let mut max = count + extensions;
        let min = self.min_size;
        if max < min {
            return Ok(0);
        }
        if self.closed {
            max = max.min(self.max_size);
            if max > self.min_size {
                self.min_size = max;
            }
        }
        let result = self.report_all(count, extensions, value);
        self.min_size = min;
        result
    }

    fn report_all(&mut self, count: usize, extensions: usize, value: f64) -> Result<usize> {
        let mut reported = 0;
        if count >= self.min_size {
            reported += self.output(value)?;
        }
        if extensions > 0 && count < self.max_size {
            reported += self.expand(extensions, value)?;
        }
        Ok(reported)
    }

    /// Reports the sets formed with subsets of the `k` most recent perfect
    /// extensions.
    fn expand(&mut self, k: usize, value: f64) -> Result<usize> {
        let mut reported = 0;
        for k in (0..k).rev() {
            let item = self.pex[self.pex.len() - 1 - k];
            let support = self.supports[self.items.len()];
            self.items.push(item);
            self.supports.push(support);
            let count = self.items.len();
            if count >= self.min_size {
                reported += self.output(value)?;
            }
            if k > 0 && count + k >= self.min_size && count < self.max_size {
                reported += self.expand(k, value)?;
            }
            self.items.pop();
            self.supports.pop();
            self.prefix = self.prefix.min(self.items.len());
        }
        Ok(reported)
    }

    fn output(&mut self, external: f64) -> Result<usize> {
        let count = self.items.len();
        let value = match self.evaluation {
            ReportEvaluation::None => 0.0,
            ReportEvaluation::LogQuotient => self.log_quotient(),
            ReportEvaluation::External => external,
        };
        if self.evaluation != ReportEvaluation::None && value < self.min_value {
            return Ok(0);
        }

        self.buffer.truncate(self.positions[self.prefix]);
        while self.prefix < count {
            if self.prefix > 0 {
                self.buffer.push_str(&self.separator);
            }
            self.buffer.push_str(&self.names[self.items[self.prefix]]);
            self.prefix += 1;
            self.positions[self.prefix] = self.buffer.len();
        }

        self.info.clear();
        self.format
            .render_set(&mut self.info, self.supports[count], self.supports[0], value);
        self.info.push('\n');
        self.out
            .write_all(self.buffer.as_bytes())
            .and_then(|_| self.out.write_all(self.info.as_bytes()))
            .map_err(AprioriError::FileWrite)?;
        self.written += 1;
        trace!(size = count, support = self.supports[count], "reported itemset");
        Ok(1)
    }

    fn log_quotient(&mut self) -> f64 {
        let count = self.items.len();
        let mut sum = self.sums[self.prefix];
        for i in self.prefix..count {
            sum += self.logs[self.items[i]];
            self.sums[i + 1] = sum;
        }
        let support = self.supports[count].max(1) as f64;
        (support.ln() - sum + (count as f64 - 1.0) * self.log_weight) / LN_2
    }

    /// Writes one itemset independent of the current set.
    pub fn write_set(&mut self, items: &[usize], support: Support, value: f64) -> Result<()> {
        self.info.clear();
        self.push_names(items);
        self.format
            .render_set(&mut self.info, support, self.supports[0], value);
        self.flush_line()
    }

    /// Writes one rule as `head <- body` followed by the information.
    pub fn write_rule(&mut self, rule: &AssociationRule) -> Result<()> {
        self.info.clear();
        self.info.push_str(&self.names[rule.head]);
        self.info.push_str(&self.implication);
        self.push_names(&rule.body);
        let quantities = Quantities {
            support: rule.support,
            body: rule.body_support,
            head: rule.head_support,
            total: self.supports[0],
            value: rule.value,
        };
        self.format.render_rule(&mut self.info, &quantities);
        self.flush_line()
    }

    fn push_names(&mut self, items: &[usize]) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.info.push_str(&self.separator);
            }
            self.info.push_str(&self.names[item]);
        }
    }

    fn flush_line(&mut self) -> Result<()> {
        self.info.push('\n');
        self.out
            .write_all(self.info.as_bytes())
            .map_err(AprioriError::FileWrite)?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(AprioriError::FileWrite)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
