use super::node::NodeId;
use super::{ItemsetTree, ROOT};
use crate::ap::tract::Support;

/// Kind of itemsets left unmarked by [`ItemsetTree::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkTarget {
    /// No superset has the same support
    Closed,
    /// No superset is frequent
    Maximal,
}

/// Which subset counters a marking pass suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubsetRule {
    Any,
    Equal(Support),
}

impl ItemsetTree {
    /// Suppresses every frequent itemset that is not closed or not
    /// maximal, so that extraction only sees the requested kind.
    ///
    /// With `by_evaluation` and a measure set, itemsets whose measure
    /// falls below the minimal value are suppressed as well and do not
    /// count as frequent supersets.
    pub fn mark(&mut self, target: MarkTarget, by_evaluation: bool) {
        let closed = target == MarkTarget::Closed;
        let mut path = std::mem::take(&mut self.path);
        if by_evaluation && !self.measure.is_none() {
            self.mark_bottom_up(closed, &mut path);
        } else {
            self.mark_top_down(closed, &mut path);
        }
        self.path = path;
    }

    /// Removes all marks left by [`mark`](Self::mark).
    pub fn clear_marks(&mut self) {
        self.empty_suppressed = false;
        for level in 0..self.height() {
            let ids: Vec<NodeId> = self.level(level).collect();
            for id in ids {
                for counter in &mut self.nodes[id].counters {
                    counter.activate();
                }
            }
        }
    }

    fn mark_top_down(&mut self, closed: bool, path: &mut Vec<usize>) {
        let threshold = if closed { self.total_weight } else { self.supp };
        if self.nodes[ROOT].counters.iter().any(|c| c.reaches(threshold)) {
            self.empty_suppressed = true;
        }
        for level in 1..self.height() {
            let ids: Vec<NodeId> = self.level(level).collect();
            for id in ids {
                for index in (0..self.nodes[id].size()).rev() {
                    let counter = self.nodes[id].counters[index];
                    if !counter.reaches(self.supp) {
                        self.nodes[id].counters[index].suppress();
                        continue;
                    }
                    let rule = if closed {
                        SubsetRule::Equal(counter.support)
                    } else {
                        SubsetRule::Any
                    };
                    self.mark_subsets(id, index, rule, path);
                }
            }
        }
    }

    fn mark_bottom_up(&mut self, closed: bool, path: &mut Vec<usize>) {
        for level in (1..self.height()).rev() {
            let ids: Vec<NodeId> = self.level(level).collect();
            for id in ids {
                for index in (0..self.nodes[id].size()).rev() {
                    let counter = self.nodes[id].counters[index];
                    if !counter.is_suppressed()
                        && (counter.support < self.supp
                            || self.evaluate(id, index, path) < self.min_value)
                    {
                        self.nodes[id].counters[index].suppress();
                        continue;
                    }
                    // already suppressed sets have a qualifying superset
                    // and pass its mark on to their own subsets
                    let rule = if closed {
                        SubsetRule::Equal(counter.support)
                    } else {
                        SubsetRule::Any
                    };
                    self.mark_subsets(id, index, rule, path);
                }
            }
        }
        let root = &self.nodes[ROOT].counters;
        let marked = if closed {
            root.iter().any(|c| c.support >= self.total_weight)
        } else {
            root.iter().any(|c| c.support >= self.supp || c.is_suppressed())
        };
        if marked {
            self.empty_suppressed = true;
        }
    }

    /// Marks all subsets of `set(node) + item(index)` with one item less.
    fn mark_subsets(&mut self, node: NodeId, index: usize, rule: SubsetRule, path: &mut Vec<usize>) {
        let item = self.nodes[node].item_at(index);
        let Some(parent) = self.nodes[node].parent else {
            return;
        };
        path.clear();
        path.push(item);
        self.mark_path(parent, path, rule);
        path[0] = self.nodes[node].item;
        self.mark_path(parent, path, rule);
        path[0] = item;
        path.insert(0, self.nodes[node].item);
        let mut current = parent;
        while let Some(above) = self.nodes[current].parent {
            self.mark_path(above, path, rule);
            path.insert(0, self.nodes[current].item);
            current = above;
        }
    }

    fn mark_path(&mut self, start: NodeId, path: &[usize], rule: SubsetRule) {
        let Some((last, prefix)) = path.split_last() else {
            return;
        };
        let mut node = start;
        for &item in prefix {
            match self.nodes[node].children.get(item) {
                Some(child) => node = child,
                None => return,
            }
        }
        let node = &mut self.nodes[node];
        let Some(slot) = node.slot(*last) else {
            return;
        };
        let counter = &mut node.counters[slot];
        match rule {
            SubsetRule::Any => counter.suppress(),
            SubsetRule::Equal(support) if counter.support == support => counter.suppress(),
            SubsetRule::Equal(_) => {}
        }
    }
}
