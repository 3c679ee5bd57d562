use super::node::NodeId;
use super::{ItemsetTree, Measure};
use crate::ap::items::Appearance;
use crate::ap::tract::Support;

/// A frequent itemset found by [`ItemsetCursor`].
#[derive(Debug, Clone, PartialEq)]
pub struct FoundItemset {
    /// Items in ascending identifier order
    pub items: Vec<usize>,
    pub support: Support,
    pub value: f64,
}

/// An association rule with a single item head.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub head: usize,
    /// Body items in ascending identifier order
    pub body: Vec<usize>,
    /// Support of body and head together
    pub support: Support,
    pub body_support: Support,
    pub head_support: Support,
    pub value: f64,
}

impl AssociationRule {
    pub fn confidence(&self) -> f64 {
        if self.body_support == 0 {
            0.0
        } else {
            self.support as f64 / self.body_support as f64
        }
    }

    /// Rule size (body items plus the head).
    pub fn len(&self) -> usize {
        self.body.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

enum Slot {
    EmptySet,
    Counter(NodeId, usize),
}

/// Walk over the counters of a tree level by level, restricted to a
/// size range.
struct LevelWalk {
    min: usize,
    max: usize,
    ascending: bool,
    size: usize,
    node: Option<NodeId>,
    index: usize,
    empty_pending: bool,
    done: bool,
}

impl LevelWalk {
    fn new(tree: &ItemsetTree, min: usize, max: usize, ascending: bool) -> Self {
        let max = max.min(tree.height());
        let mut walk = Self {
            min,
            max,
            ascending,
            size: if ascending { min } else { max },
            node: None,
            index: 0,
            empty_pending: false,
            done: min > max,
        };
        if !walk.done {
            walk.enter_level(tree);
        }
        walk
    }

    fn enter_level(&mut self, tree: &ItemsetTree) {
        self.index = 0;
        if self.size == 0 {
            self.empty_pending = true;
            self.node = None;
        } else {
            self.node = tree.levels.get(self.size - 1).copied().flatten();
        }
    }

    fn next_level(&mut self, tree: &ItemsetTree) {
        if self.ascending {
            if self.size >= self.max {
                self.done = true;
                return;
            }
            self.size += 1;
        } else {
            if self.size == 0 || self.size <= self.min {
                self.done = true;
                return;
            }
            self.size -= 1;
        }
        self.enter_level(tree);
    }

    fn next_slot(&mut self, tree: &ItemsetTree) -> Option<Slot> {
        loop {
            if self.done {
                return None;
            }
            if self.empty_pending {
                self.empty_pending = false;
                self.next_level(tree);
                return Some(Slot::EmptySet);
            }
            match self.node {
                None => self.next_level(tree),
                Some(id) => {
                    let node = &tree.nodes[id];
                    if self.index < node.size() {
                        self.index += 1;
                        return Some(Slot::Counter(id, self.index - 1));
                    }
                    self.index = 0;
                    self.node = node.succ;
                    if self.node.is_none() {
                        self.next_level(tree);
                    }
                }
            }
        }
    }
}

/// Iterator over the frequent itemsets of a tree, ordered by size.
pub struct ItemsetCursor<'a> {
    tree: &'a ItemsetTree,
    walk: LevelWalk,
    path: Vec<usize>,
}

impl Iterator for ItemsetCursor<'_> {
    type Item = FoundItemset;

    fn next(&mut self) -> Option<FoundItemset> {
        let tree = self.tree;
        loop {
            let (id, index) = match self.walk.next_slot(tree)? {
                Slot::EmptySet => {
                    if tree.empty_set_qualifies() {
                        return Some(FoundItemset {
                            items: Vec::new(),
                            support: tree.total_weight,
                            value: 0.0,
                        });
                    }
                    continue;
                }
                Slot::Counter(id, index) => (id, index),
            };
            let node = &tree.nodes[id];
            let item = node.item_at(index);
            if tree.appearances[item] == Appearance::Ignore {
                continue;
            }
            let counter = node.counters[index];
            if !counter.reaches(tree.supp) || counter.support > tree.smax {
                continue;
            }
            let value = tree.evaluate(id, index, &mut self.path);
            if !tree.measure.is_none() && value < tree.min_value {
                continue;
            }
            let mut items = Vec::with_capacity(self.walk.size);
            tree.items_of(id, &mut items);
            items.push(item);
            return Some(FoundItemset {
                items,
                support: counter.support,
                value,
            });
        }
    }
}

/// Position of the rule walk inside one itemset.
struct HeadChain {
    node: NodeId,
    index: usize,
    support: Support,
    head: usize,
    /// Node whose set holds the items in front of the head
    above: NodeId,
    /// Items between `above` and the end of the set, head excluded
    path: Vec<usize>,
    head_only: bool,
}

/// Iterator over the association rules of a tree, ordered by rule size.
pub struct RuleCursor<'a> {
    tree: &'a ItemsetTree,
    walk: LevelWalk,
    chain: Option<HeadChain>,
}

impl RuleCursor<'_> {
    fn next_set(&mut self) -> Option<HeadChain> {
        let tree = self.tree;
        loop {
            let Slot::Counter(id, index) = self.walk.next_slot(tree)? else {
                continue;
            };
            let node = &tree.nodes[id];
            let item = node.item_at(index);
            let app = tree.appearances[item];
            if app == Appearance::Ignore || (app == Appearance::Head && node.head_only) {
                continue;
            }
            let support = node.counters[index].support;
            if support < tree.supp || support > tree.smax {
                continue;
            }
            return Some(HeadChain {
                node: id,
                index,
                support,
                head: item,
                above: id,
                path: Vec::new(),
                head_only: app == Appearance::Head || node.head_only,
            });
        }
    }

    /// Moves the head one item towards the front of the set.
    fn advance(&mut self) -> bool {
        let tree = self.tree;
        let Some(chain) = self.chain.as_mut() else {
            return false;
        };
        let Some(parent) = tree.nodes[chain.above].parent else {
            return false;
        };
        chain.path.insert(0, chain.head);
        chain.head = tree.nodes[chain.above].item;
        chain.above = parent;
        true
    }

    fn current(&self) -> Option<AssociationRule> {
        let tree = self.tree;
        let chain = self.chain.as_ref()?;
        let app = tree.appearances[chain.head];
        if !app.in_head() || (app != Appearance::Head && chain.head_only) {
            return None;
        }
        let body_support = if chain.path.is_empty() {
            tree.set_support(chain.node)
        } else {
            tree.lookup(chain.above, &chain.path)
                .map_or(0, |counter| counter.support)
        };
        if body_support < tree.rule || (chain.support as f64) < body_support as f64 * tree.conf {
            return None;
        }
        let head_support = tree.head_support(chain.head);
        let value =
            tree.measure
                .rule_value(chain.support, body_support, head_support, tree.total_weight);
        if !matches!(tree.measure, Measure::None | Measure::LogQuotient) && value < tree.min_value {
            return None;
        }
        let mut body = Vec::new();
        tree.items_of(chain.node, &mut body);
        body.push(tree.nodes[chain.node].item_at(chain.index));
        body.retain(|&item| item != chain.head);
        Some(AssociationRule {
            head: chain.head,
            body,
            support: chain.support,
            body_support,
            head_support,
            value,
        })
    }
}

impl Iterator for RuleCursor<'_> {
    type Item = AssociationRule;

    fn next(&mut self) -> Option<AssociationRule> {
        loop {
            if self.chain.is_some() {
                if !self.advance() {
                    self.chain = None;
                    continue;
                }
            } else {
                self.chain = Some(self.next_set()?);
            }
            if let Some(rule) = self.current() {
                return Some(rule);
            }
        }
    }
}

impl ItemsetTree {
    /// Iterates the frequent itemsets with `min..=max` items, smallest
    /// first if `ascending`, largest first otherwise.
    pub fn itemsets(&self, min: usize, max: usize, ascending: bool) -> ItemsetCursor<'_> {
        ItemsetCursor {
            tree: self,
            walk: LevelWalk::new(self, min, max, ascending),
            path: Vec::new(),
        }
    }

    /// Iterates the association rules with `min..=max` items, body and
    /// head counted together.
    pub fn rules(&self, min: usize, max: usize, ascending: bool) -> RuleCursor<'_> {
        RuleCursor {
            tree: self,
            walk: LevelWalk::new(self, min, max, ascending),
            chain: None,
        }
    }

    fn empty_set_qualifies(&self) -> bool {
        !self.empty_suppressed
            && self.total_weight >= self.supp
            && self.total_weight <= self.smax
            && (self.measure.is_none() || self.min_value <= 0.0)
    }
}

impl ItemsetTree {
    /// Collects the frequent itemsets with `min..=max` items grouped by size.
    pub fn frequent_levels(&self, min: usize, max: usize) -> Vec<crate::ap::utils::FrequentLevel> {
        crate::ap::utils::storage::collect_levels(self.itemsets(min, max, true), min)
    }
}
