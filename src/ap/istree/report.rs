use std::io::Write;

use super::node::NodeId;
use super::{ItemsetTree, Measure, ROOT};
use crate::ap::error::Result;
use crate::ap::report::ItemsetReporter;
use crate::ap::tract::Support;

impl ItemsetTree {
    /// Reports all frequent itemsets depth first through `reporter`.
    ///
    /// Perfect extensions are handed to the reporter instead of being
    /// descended into. Returns the number of itemsets written.
    pub fn report<W: Write>(&self, reporter: &mut ItemsetReporter<W>) -> Result<usize> {
        let mut path = Vec::new();
        self.report_node(ROOT, self.total_weight, !self.empty_suppressed, 0.0, reporter, &mut path)
    }

    fn report_node<W: Write>(
        &self,
        id: NodeId,
        support: Support,
        reportable: bool,
        value: f64,
        reporter: &mut ItemsetReporter<W>,
        path: &mut Vec<usize>,
    ) -> Result<usize> {
        let node = &self.nodes[id];
        let spx = if self.perfect {
            for (index, counter) in node.counters.iter().enumerate() {
                if counter.support >= support {
                    reporter.add_perfect_extension(node.item_at(index));
                }
            }
            support
        } else {
            Support::MAX
        };

        let mut reported = 0;
        if reportable && support <= self.smax {
            reported += reporter.report(value)?;
        }
        for (index, counter) in node.counters.iter().enumerate() {
            if counter.support < self.supp || counter.support >= spx {
                continue;
            }
            let item = node.item_at(index);
            let value = match self.measure {
                Measure::None | Measure::LogQuotient => 0.0,
                _ => self.evaluate(id, index, path),
            };
            reporter.add(item, counter.support);
            match node.children.get(item) {
                Some(child) => {
                    reported += self.report_node(
                        child,
                        counter.support,
                        !counter.is_suppressed(),
                        value,
                        reporter,
                        path,
                    )?;
                }
                None if !counter.is_suppressed() && counter.support <= self.smax => {
                    reported += reporter.report(value)?;
                }
                None => {}
            }
            reporter.remove(1);
        }
        Ok(reported)
    }
}
