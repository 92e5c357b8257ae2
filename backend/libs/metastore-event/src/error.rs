//! Error types for canonical event construction

use thiserror::Error;

/// Result type for building canonical events
pub type Result<T> = std::result::Result<T, MetaStoreEventError>;

/// Errors raised when a builder holds an inconsistent event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaStoreEventError {
    /// Partition columns and values are not positionally aligned
    #[error("partition columns ({columns}) and values ({values}) differ in length")]
    PartitionMismatch { columns: usize, values: usize },

    /// A database or table identifier is empty
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),
}
