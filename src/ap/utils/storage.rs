use crate::ap::istree::FoundItemset;
use crate::ap::tract::Support;

/// Flat storage of equally typed itemsets with their supports.
#[derive(Debug, Clone, Default)]
pub struct ItemsetStorage {
    pub items: Vec<usize>,
    pub offsets: Vec<(usize, usize)>,
    pub supports: Vec<Support>,
    pub values: Vec<f64>,
}

/// All reported itemsets of one size.
#[derive(Debug, Clone)]
pub struct FrequentLevel {
    pub storage: ItemsetStorage,
    pub itemset_size: usize,
}

impl ItemsetStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, items: &[usize], support: Support, value: f64) {
        let start = self.items.len();
        self.items.extend_from_slice(items);
        self.offsets.push((start, items.len()));
        self.supports.push(support);
        self.values.push(value);
    }

    pub(crate) fn get_itemset(&self, idx: usize) -> &[usize] {
        let (start, len) = self.offsets[idx];
        &self.items[start..start + len]
    }

    pub(crate) fn len(&self) -> usize {
        self.offsets.len()
    }
}

impl FrequentLevel {
    pub fn new(itemset_size: usize) -> Self {
        Self {
            storage: ItemsetStorage::new(),
            itemset_size,
        }
    }

    /// Appends an itemset and returns its index in the level.
    pub fn add_itemset(&mut self, items: &[usize], support: Support, value: f64) -> usize {
        debug_assert_eq!(items.len(), self.itemset_size);
        self.storage.push(items, support, value);
        self.storage.len() - 1
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    pub fn get_itemset(&self, idx: usize) -> &[usize] {
        self.storage.get_itemset(idx)
    }

    pub fn support(&self, idx: usize) -> Support {
        self.storage.supports[idx]
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.storage.values[idx]
    }

    pub fn iter_itemsets(&self) -> impl Iterator<Item = &[usize]> {
        (0..self.storage.len()).map(move |idx| self.get_itemset(idx))
    }
}

/// Groups itemsets by size. Level `k` of the result holds the sets with
/// `k + min_size` items; sizes without itemsets yield empty levels.
pub fn collect_levels<I>(itemsets: I, min_size: usize) -> Vec<FrequentLevel>
where
    I: IntoIterator<Item = FoundItemset>,
{
    let mut levels: Vec<FrequentLevel> = Vec::new();
    for set in itemsets {
        let size = set.items.len();
        if size < min_size {
            continue;
        }
        while levels.len() <= size - min_size {
            levels.push(FrequentLevel::new(min_size + levels.len()));
        }
        levels[size - min_size].add_itemset(&set.items, set.support, set.value);
    }
    levels
}
