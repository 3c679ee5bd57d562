pub mod count;
pub mod cursor;
pub mod mark;
pub mod measure;
pub mod node;
pub mod report;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::Result;
use super::items::{Appearance, ItemBase};
use super::memory::{estimate_child_array_size, estimate_node_size, MemoryBudget};
use super::tract::Support;

pub use cursor::{AssociationRule, FoundItemset, ItemsetCursor, RuleCursor};
pub use mark::MarkTarget;
pub use measure::{Aggregation, Measure};
pub use node::{Children, Counter, CounterState, IsNode, Layout, NodeId};

const ROOT: NodeId = 0;

/// Which support a rule has to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSupport {
    /// The rule body must reach the minimal support
    #[default]
    Body,
    /// Body and head together must reach the minimal support
    Both,
}

/// Thresholds fixed at tree creation. Supports are absolute.
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub min_support: Support,
    pub max_support: Support,
    pub min_confidence: f64,
    pub rule_support: RuleSupport,
    pub perfect_extensions: bool,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            min_support: 1,
            max_support: Support::MAX,
            min_confidence: 1.0,
            rule_support: RuleSupport::Both,
            perfect_extensions: true,
        }
    }
}

/// Level-wise candidate tree of the Apriori algorithm.
///
/// Nodes live in an arena and refer to each other by index. Level `k`
/// holds the nodes of the itemsets of size `k`; their counters count the
/// itemsets of size `k + 1`.
#[derive(Debug, Clone)]
pub struct ItemsetTree {
    nodes: Vec<IsNode>,
    levels: Vec<Option<NodeId>>,
    appearances: Vec<Appearance>,
    total_weight: Support,
    empty_suppressed: bool,
    /// Minimal support of an itemset in the tree
    supp: Support,
    /// Minimal support of a rule body
    rule: Support,
    smax: Support,
    conf: f64,
    perfect: bool,
    measure: Measure,
    aggregation: Aggregation,
    min_value: f64,
    prune_level: Option<usize>,
    budget: MemoryBudget,
    path: Vec<usize>,
}

impl ItemsetTree {
    /// Creates a tree with the root counters set to the item frequencies.
    pub fn new(base: &ItemBase, params: &TreeParams) -> Self {
        let rule = params.min_support.max(1);
        let smax = params.max_support.max(rule);
        let supp = match params.rule_support {
            RuleSupport::Both => params.min_support,
            RuleSupport::Body => (params.min_confidence * params.min_support as f64).ceil() as Support,
        };
        Self {
            nodes: vec![IsNode::root(&base.frequencies())],
            levels: vec![Some(ROOT)],
            appearances: base.appearances(),
            total_weight: base.total_weight(),
            empty_suppressed: false,
            supp: supp.max(1),
            rule,
            smax,
            conf: params.min_confidence * (1.0 - f64::EPSILON),
            perfect: params.perfect_extensions,
            measure: Measure::None,
            aggregation: Aggregation::None,
            min_value: 1.0,
            prune_level: None,
            budget: MemoryBudget::unlimited(),
            path: Vec::new(),
        }
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the additional evaluation measure.
    ///
    /// With `prune_level` set, candidates of at least that size whose
    /// measure falls below `min_value` are not extended.
    pub fn set_evaluation(
        &mut self,
        measure: Measure,
        aggregation: Aggregation,
        min_value: f64,
        prune_level: Option<usize>,
    ) {
        self.measure = measure;
        self.aggregation = aggregation;
        self.min_value = min_value * (1.0 - f64::EPSILON);
        self.prune_level = prune_level.filter(|&level| level > 0);
    }

    pub fn height(&self) -> usize {
        self.levels.len()
    }

    pub fn total_weight(&self) -> Support {
        self.total_weight
    }

    /// Minimal support of an itemset kept in the tree.
    pub fn min_support(&self) -> Support {
        self.supp
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    pub fn node(&self, id: NodeId) -> &IsNode {
        &self.nodes[id]
    }

    /// Nodes of one level in successor order.
    pub fn level(&self, level: usize) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.levels.get(level).copied().flatten();
        std::iter::from_fn(move || {
            let current = next?;
            next = self.nodes[current].succ;
            Some(current)
        })
    }

    /// Number of nodes reachable through the level lists.
    pub fn node_count(&self) -> usize {
        (0..self.height()).map(|level| self.level(level).count()).sum()
    }

    /// Support of an itemset with items in ascending order, or `None`
    /// when the itemset is not represented in the tree.
    pub fn support(&self, items: &[usize]) -> Option<Support> {
        if items.is_empty() {
            return Some(self.total_weight);
        }
        self.lookup(ROOT, items).map(|counter| counter.support)
    }

    /// Counter for the set `path` relative to the set of `start`.
    fn lookup(&self, start: NodeId, path: &[usize]) -> Option<Counter> {
        let (last, prefix) = path.split_last()?;
        let mut node = start;
        for &item in prefix {
            node = self.nodes[node].children.get(item)?;
        }
        self.nodes[node].counter(*last)
    }

    fn head_support(&self, item: usize) -> Support {
        self.nodes[ROOT].counters[item].support
    }

    /// Items of the set represented by `node`, in ascending order.
    fn items_of(&self, mut node: NodeId, items: &mut Vec<usize>) {
        items.clear();
        while let Some(parent) = self.nodes[node].parent {
            items.push(self.nodes[node].item);
            node = parent;
        }
        items.reverse();
    }

    /// Support at which an extension of `node` is implied by its set.
    fn perfect_support(&self, node: NodeId) -> Support {
        if self.perfect {
            self.set_support(node)
        } else {
            Support::MAX
        }
    }

    /// Marks the items that still occur in some frequent itemset of the
    /// deepest level and returns their number.
    pub fn check_usage(&self, marks: &mut Vec<bool>) -> usize {
        marks.clear();
        marks.resize(self.appearances.len(), false);
        self.mark_used(ROOT, marks);
        marks.iter().filter(|&&used| used).count()
    }

    fn mark_used(&self, id: NodeId, marks: &mut [bool]) -> bool {
        let node = &self.nodes[id];
        let mut used = false;
        if node.is_new_leaf() {
            for (index, counter) in node.counters.iter().enumerate() {
                if counter.reaches(self.supp) {
                    marks[node.item_at(index)] = true;
                    used = true;
                }
            }
        } else if !node.skip {
            for (_, child) in node.children.iter() {
                used |= self.mark_used(child, marks);
            }
        }
        if used && node.parent.is_some() {
            marks[node.item] = true;
        }
        used
    }

    /// Adds the next level of candidate nodes.
    ///
    /// Returns `Ok(false)` if no candidate could be created. On budget
    /// exhaustion the partially built level is removed again and the tree
    /// stays at its previous height, with counters suppressed by
    /// evaluation during the failed pass restored.
    pub fn add_level(&mut self) -> Result<bool> {
        let arena_len = self.nodes.len();
        let charged = self.budget.used();
        let mut path = std::mem::take(&mut self.path);
        let mut pruned = Vec::new();
        let grown = self.grow(&mut path, &mut pruned);
        self.path = path;
        match grown {
            Ok(Some(head)) => {
                self.levels.push(Some(head));
                self.needed(ROOT);
                debug!(
                    level = self.height(),
                    nodes = self.nodes.len() - arena_len,
                    "added tree level"
                );
                Ok(true)
            }
            Ok(None) => {
                self.cleanup(arena_len, charged);
                Ok(false)
            }
            Err(err) => {
                warn!(level = self.height() + 1, error = %err, "level growth aborted");
                for (node, index) in pruned {
                    self.nodes[node].counters[index].activate();
                }
                self.cleanup(arena_len, charged);
                Err(err)
            }
        }
    }

    fn grow(
        &mut self,
        path: &mut Vec<usize>,
        pruned: &mut Vec<(NodeId, usize)>,
    ) -> Result<Option<NodeId>> {
        let mut head = None;
        let mut tail: Option<NodeId> = None;
        let mut current = self.levels[self.height() - 1];
        while let Some(node) = current {
            let spx = self.perfect_support(node);
            let mut created = Vec::new();
            for index in 0..self.nodes[node].size() {
                if let Some(child) = self.create_child(node, index, spx, path, pruned)? {
                    created.push(child);
                }
            }
            current = self.nodes[node].succ;
            let (Some(&first), Some(&last)) = (created.first(), created.last()) else {
                self.nodes[node].skip = true;
                continue;
            };
            for &child in &created {
                match tail {
                    Some(t) => self.nodes[t].succ = Some(child),
                    None => head = Some(child),
                }
                tail = Some(child);
            }
            let children = match self.nodes[node].layout {
                Layout::Dense { .. } => {
                    let first_item = self.nodes[first].item;
                    let len = self.nodes[last].item - first_item + 1;
                    self.budget.charge(estimate_child_array_size(len))?;
                    let mut slots = vec![None; len];
                    for &child in &created {
                        slots[self.nodes[child].item - first_item] = Some(child);
                    }
                    Children::Dense {
                        first: first_item,
                        slots,
                    }
                }
                Layout::Sparse { .. } => {
                    self.budget.charge(estimate_child_array_size(created.len()))?;
                    Children::Sparse(
                        created
                            .iter()
                            .map(|&child| (self.nodes[child].item, child))
                            .collect(),
                    )
                }
            };
            self.nodes[node].children = children;
        }
        Ok(head)
    }

    /// Creates the child of `node` for the counter at `index`, if the
    /// extended set is frequent and has candidate extensions itself.
    fn create_child(
        &mut self,
        node: NodeId,
        index: usize,
        spx: Support,
        path: &mut Vec<usize>,
        pruned: &mut Vec<(NodeId, usize)>,
    ) -> Result<Option<NodeId>> {
        let parent = &self.nodes[node];
        let counter = parent.counters[index];
        if !counter.reaches(self.supp) || counter.support >= spx {
            return Ok(None);
        }
        let item = parent.item_at(index);
        let app = self.appearances[item];
        if app == Appearance::Ignore || (app == Appearance::Head && parent.head_only) {
            return Ok(None);
        }
        let head_only = app == Appearance::Head || parent.head_only;

        if !self.measure.is_none()
            && self.prune_level.is_some_and(|level| self.height() >= level)
            && self.evaluate(node, index, path) < self.min_value
        {
            self.nodes[node].counters[index].suppress();
            pruned.push((node, index));
            return Ok(None);
        }

        let parent = &self.nodes[node];
        let mut body = u8::from(counter.support >= self.rule);
        let mut ids = Vec::new();
        for i in index + 1..parent.size() {
            let candidate = parent.item_at(i);
            let app = self.appearances[candidate];
            if app == Appearance::Ignore || (head_only && app == Appearance::Head) {
                continue;
            }
            let c = parent.counters[i];
            if !c.reaches(self.supp) || c.support >= spx {
                continue;
            }
            body &= 1;
            if c.support >= self.rule {
                body |= 2;
            }
            if self.subsets_frequent(node, item, candidate, path, &mut body) && body != 0 {
                ids.push(candidate);
            }
        }
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return Ok(None);
        };

        let range = last - first + 1;
        let (layout, size, map_len) = if 2 * ids.len() >= range {
            (Layout::Dense { offset: first }, range, 0)
        } else {
            let len = ids.len();
            (Layout::Sparse { ids }, len, len)
        };
        self.budget.charge(estimate_node_size(size, map_len))?;
        self.nodes.try_reserve(1)?;
        self.nodes.push(IsNode {
            parent: Some(node),
            succ: None,
            item,
            head_only,
            layout,
            counters: vec![Counter::default(); size],
            children: Children::None,
            skip: false,
        });
        Ok(Some(self.nodes.len() - 1))
    }

    /// Checks that every subset of `set(node) + item + candidate` that
    /// drops one item of `set(node)` reaches the minimal support.
    fn subsets_frequent(
        &self,
        node: NodeId,
        item: usize,
        candidate: usize,
        path: &mut Vec<usize>,
        body: &mut u8,
    ) -> bool {
        path.clear();
        path.extend_from_slice(&[item, candidate]);
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            match self.lookup(parent, path) {
                Some(counter) if counter.reaches(self.supp) => {
                    if counter.support >= self.rule {
                        *body |= 4;
                    }
                }
                _ => return false,
            }
            path.insert(0, self.nodes[current].item);
            current = parent;
        }
        true
    }

    /// Sets the skip flag on subtrees without new leaves.
    fn needed(&mut self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        if node.is_new_leaf() {
            return true;
        }
        if node.skip {
            return false;
        }
        let children: Vec<NodeId> = node.children.iter().map(|(_, child)| child).collect();
        let mut needed = false;
        for child in children {
            needed |= self.needed(child);
        }
        if !needed {
            self.nodes[id].skip = true;
        }
        needed
    }

    fn cleanup(&mut self, arena_len: usize, charged: usize) {
        self.nodes.truncate(arena_len);
        let deepest: Vec<NodeId> = self.level(self.height() - 1).collect();
        for id in deepest {
            let node = &mut self.nodes[id];
            node.children = Children::None;
            node.skip = false;
        }
        self.budget.rollback(charged);
    }

    /// Removes counters below the minimal support from the deepest level
    /// and drops nodes left without counters.
    pub fn prune(&mut self) {
        let height = self.height();
        if height <= 1 {
            return;
        }
        let supp = self.supp;
        let deepest: Vec<NodeId> = self.level(height - 1).collect();
        let mut pruned = 0usize;
        for &id in &deepest {
            let node = &mut self.nodes[id];
            let before = node.counters.len();
            match &mut node.layout {
                Layout::Dense { offset } => {
                    let first = node.counters.iter().position(|c| c.reaches(supp));
                    let last = node.counters.iter().rposition(|c| c.reaches(supp));
                    match (first, last) {
                        (Some(first), Some(last)) => {
                            node.counters.truncate(last + 1);
                            node.counters.drain(..first);
                            *offset += first;
                        }
                        _ => node.counters.clear(),
                    }
                }
                Layout::Sparse { ids } => {
                    let mut kept = 0;
                    for i in 0..node.counters.len() {
                        if node.counters[i].reaches(supp) {
                            node.counters[kept] = node.counters[i];
                            ids[kept] = ids[i];
                            kept += 1;
                        }
                    }
                    node.counters.truncate(kept);
                    ids.truncate(kept);
                }
            }
            pruned += before - node.counters.len();
            let released = estimate_node_size(before - node.counters.len(), 0)
                - estimate_node_size(0, 0);
            self.budget.release(released);
        }

        let parents: Vec<NodeId> = self.level(height - 2).collect();
        for id in parents {
            let children = std::mem::replace(&mut self.nodes[id].children, Children::None);
            let alive = |child: &NodeId| self.nodes[*child].size() > 0;
            let children = match children {
                Children::None => Children::None,
                Children::Dense { first, slots } => {
                    let start = slots.iter().position(|s| s.as_ref().is_some_and(alive));
                    let end = slots.iter().rposition(|s| s.as_ref().is_some_and(alive));
                    match (start, end) {
                        (Some(start), Some(end)) => Children::Dense {
                            first: first + start,
                            slots: slots[start..=end]
                                .iter()
                                .map(|s| s.filter(|c| alive(c)))
                                .collect(),
                        },
                        _ => Children::None,
                    }
                }
                Children::Sparse(list) => {
                    let list: Vec<_> = list.into_iter().filter(|(_, c)| alive(c)).collect();
                    if list.is_empty() {
                        Children::None
                    } else {
                        Children::Sparse(list)
                    }
                }
            };
            let node = &mut self.nodes[id];
            if children.is_empty() {
                node.skip = true;
            }
            node.children = children;
        }

        let mut previous: Option<NodeId> = None;
        let mut head = None;
        for id in deepest {
            if self.nodes[id].size() == 0 {
                continue;
            }
            match previous {
                Some(p) => self.nodes[p].succ = Some(id),
                None => head = Some(id),
            }
            previous = Some(id);
        }
        if let Some(p) = previous {
            self.nodes[p].succ = None;
        }
        self.levels[height - 1] = head;
        debug!(level = height, counters = pruned, "pruned infrequent counters");
    }
}
