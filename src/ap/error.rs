//! Error types for the miner.

use std::path::PathBuf;
use thiserror::Error;

use super::memory::MemoryError;

/// Result type alias for mining operations
pub type Result<T> = std::result::Result<T, AprioriError>;

/// Main error type for mining operations
#[derive(Error, Debug)]
pub enum AprioriError {
    /// A node or counter allocation did not fit into the memory budget
    #[error("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    /// An input or output file could not be opened
    #[error("cannot open file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading transactions or configuration failed
    #[error("read error: {0}")]
    FileRead(#[source] std::io::Error),

    /// Writing the result failed
    #[error("write error: {0}")]
    FileWrite(#[source] std::io::Error),

    /// Unknown target type code
    #[error("invalid target type '{0}'")]
    InvalidTarget(char),

    /// Size bounds are inconsistent
    #[error("invalid set size range {min}..={max}")]
    InvalidSize { min: usize, max: usize },

    /// Support threshold out of range
    #[error("invalid minimal support {0}")]
    InvalidSupport(f64),

    /// Confidence threshold out of range
    #[error("invalid minimal confidence {0}")]
    InvalidConfidence(f64),

    /// Unknown evaluation measure code
    #[error("invalid evaluation measure '{0}'")]
    InvalidMeasure(char),

    /// Unknown aggregation mode code
    #[error("invalid aggregation mode '{0}'")]
    InvalidAggregation(char),

    /// Unknown item appearance indicator
    #[error("invalid appearance indicator '{0}'")]
    InvalidAppearance(String),

    /// Unknown item order code
    #[error("invalid item order {0}")]
    InvalidItemOrder(i32),

    /// An item name was registered twice
    #[error("duplicate item '{0}'")]
    DuplicateItem(String),

    /// Configuration text could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// The transaction bag is empty or has no weight
    #[error("no transactions to work on")]
    NoTransactions,

    /// No item reached the minimal support after recoding
    #[error("no frequent items found")]
    NoFrequentItems,
}

impl From<MemoryError> for AprioriError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::BudgetExceeded { requested, available } => {
                AprioriError::OutOfMemory { requested, available }
            }
        }
    }
}

impl From<std::collections::TryReserveError> for AprioriError {
    fn from(_: std::collections::TryReserveError) -> Self {
        AprioriError::OutOfMemory { requested: 0, available: 0 }
    }
}

impl From<toml::de::Error> for AprioriError {
    fn from(err: toml::de::Error) -> Self {
        AprioriError::Config(err.to_string())
    }
}

impl AprioriError {
    /// Whether this is the empty-result outcome rather than a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, AprioriError::NoFrequentItems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_out_of_memory() {
        let err = AprioriError::OutOfMemory { requested: 64, available: 16 };
        assert_eq!(
            err.to_string(),
            "out of memory: requested 64 bytes, 16 available"
        );
    }

    #[test]
    fn test_error_display_codes() {
        assert_eq!(
            AprioriError::InvalidTarget('z').to_string(),
            "invalid target type 'z'"
        );
        assert_eq!(
            AprioriError::InvalidSize { min: 4, max: 2 }.to_string(),
            "invalid set size range 4..=2"
        );
    }

    #[test]
    fn test_memory_error_converts() {
        let err: AprioriError = MemoryError::BudgetExceeded { requested: 10, available: 3 }.into();
        assert!(matches!(
            err,
            AprioriError::OutOfMemory { requested: 10, available: 3 }
        ));
    }

    #[test]
    fn test_empty_result_is_distinguished() {
        assert!(AprioriError::NoFrequentItems.is_empty_result());
        assert!(!AprioriError::NoTransactions.is_empty_result());
    }
}
