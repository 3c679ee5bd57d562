use crate::ap::tract::Support;

pub type NodeId = usize;

/// Whether a counter takes part in extension and extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CounterState {
    #[default]
    Active,
    /// Pruned by evaluation or marked as not closed/maximal. A suppressed
    /// counter is treated as below every support threshold.
    Suppressed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub support: Support,
    pub state: CounterState,
}

impl Counter {
    pub fn is_suppressed(&self) -> bool {
        self.state == CounterState::Suppressed
    }

    /// Threshold test that fails for suppressed counters.
    pub fn reaches(&self, min: Support) -> bool {
        !self.is_suppressed() && self.support >= min
    }

    pub fn suppress(&mut self) {
        self.state = CounterState::Suppressed;
    }

    pub fn activate(&mut self) {
        self.state = CounterState::Active;
    }
}

/// Mapping from counter slots to item identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Slot `i` counts item `offset + i`
    Dense { offset: usize },
    /// Slot `i` counts item `ids[i]`, ids ascending
    Sparse { ids: Vec<usize> },
}

/// Child array of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    None,
    /// Slot `i` holds the child for item `first + i`, if any
    Dense { first: usize, slots: Vec<Option<NodeId>> },
    /// Children ascending by item
    Sparse(Vec<(usize, NodeId)>),
}

impl Children {
    pub fn get(&self, item: usize) -> Option<NodeId> {
        match self {
            Children::None => None,
            Children::Dense { first, slots } => item
                .checked_sub(*first)
                .and_then(|i| slots.get(i).copied().flatten()),
            Children::Sparse(children) => children
                .binary_search_by_key(&item, |&(id, _)| id)
                .ok()
                .map(|i| children[i].1),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Children::None => true,
            Children::Dense { slots, .. } => slots.is_empty(),
            Children::Sparse(children) => children.is_empty(),
        }
    }

    /// Existing children, ascending by item.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (usize, NodeId)> + '_> {
        match self {
            Children::None => Box::new(std::iter::empty()),
            Children::Dense { first, slots } => Box::new(
                slots
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, c)| c.map(|c| (first + i, c))),
            ),
            Children::Sparse(children) => Box::new(children.iter().copied()),
        }
    }
}

/// One itemset of the candidate tree together with the counters of its
/// one-item extensions.
#[derive(Debug, Clone)]
pub struct IsNode {
    pub parent: Option<NodeId>,
    /// Next node on the same level
    pub succ: Option<NodeId>,
    /// Item extending the parent's set (unused for the root)
    pub item: usize,
    /// An item on the path may only appear in rule heads
    pub head_only: bool,
    pub layout: Layout,
    pub counters: Vec<Counter>,
    pub children: Children,
    /// Nothing below this node needs counting
    pub skip: bool,
}

impl IsNode {
    pub fn root(frequencies: &[Support]) -> Self {
        Self {
            parent: None,
            succ: None,
            item: 0,
            head_only: false,
            layout: Layout::Dense { offset: 0 },
            counters: frequencies
                .iter()
                .map(|&support| Counter {
                    support,
                    state: CounterState::Active,
                })
                .collect(),
            children: Children::None,
            skip: false,
        }
    }

    pub fn size(&self) -> usize {
        self.counters.len()
    }

    pub fn item_at(&self, index: usize) -> usize {
        match &self.layout {
            Layout::Dense { offset } => offset + index,
            Layout::Sparse { ids } => ids[index],
        }
    }

    pub fn slot(&self, item: usize) -> Option<usize> {
        match &self.layout {
            Layout::Dense { offset } => item
                .checked_sub(*offset)
                .filter(|&i| i < self.counters.len()),
            Layout::Sparse { ids } => ids.binary_search(&item).ok(),
        }
    }

    pub fn counter(&self, item: usize) -> Option<Counter> {
        self.slot(item).map(|i| self.counters[i])
    }

    /// Counted in the next pass: no children and not skipped.
    pub fn is_new_leaf(&self) -> bool {
        !self.skip && matches!(self.children, Children::None)
    }
}
