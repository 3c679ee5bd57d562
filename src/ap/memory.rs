use thiserror::Error;

/// Byte budget for the nodes and child arrays of an itemset tree.
///
/// A level that fails to grow releases everything it charged, so a tree
/// that ran out of budget stays usable at its previous height.
#[derive(Debug, Clone)]
pub struct MemoryBudget {
    limit: usize,
    used: usize,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl MemoryBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Charges `bytes`, failing without any change if the limit would be
    /// exceeded.
    pub fn charge(&mut self, bytes: usize) -> Result<(), MemoryError> {
        match self.used.checked_add(bytes) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => Err(MemoryError::BudgetExceeded {
                requested: bytes,
                available: self.available(),
            }),
        }
    }

    pub fn release(&mut self, bytes: usize) {
        self.used = self.used.saturating_sub(bytes);
    }

    /// Releases everything charged after `used()` returned `mark`.
    pub fn rollback(&mut self, mark: usize) {
        self.used = self.used.min(mark);
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("node budget exceeded: requested {requested} bytes, {available} available")]
    BudgetExceeded { requested: usize, available: usize },
}

/// Bytes charged for a tree node with `counters` counter slots and `ids`
/// explicit item identifiers.
pub fn estimate_node_size(counters: usize, ids: usize) -> usize {
    const HEADER: usize = 6 * std::mem::size_of::<usize>();
    let counter = std::mem::size_of::<u64>() + std::mem::size_of::<bool>();
    HEADER + counters * counter + ids * std::mem::size_of::<usize>()
}

/// Bytes charged for a child array with `len` slots.
pub fn estimate_child_array_size(len: usize) -> usize {
    len * std::mem::size_of::<Option<usize>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_and_rollback() {
        let mut budget = MemoryBudget::new(100);
        budget.charge(60).unwrap();
        let mark = budget.used();
        budget.charge(30).unwrap();
        assert_eq!(
            budget.charge(20),
            Err(MemoryError::BudgetExceeded {
                requested: 20,
                available: 10
            })
        );
        assert_eq!(budget.used(), 90);
        budget.rollback(mark);
        assert_eq!(budget.available(), 40);
        budget.release(100);
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn test_unlimited_never_fails() {
        let mut budget = MemoryBudget::unlimited();
        budget.charge(usize::MAX / 2).unwrap();
        assert_eq!(budget.limit(), usize::MAX);
    }
}
