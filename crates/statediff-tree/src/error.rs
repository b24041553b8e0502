//! Error types for the tree crate.

use statediff_store::StoreError;
use statediff_types::Version;

/// Errors that can occur while loading or writing a versioned tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Trees must be scoped to a non-empty namespace.
    #[error("tree prefix cannot be empty")]
    EmptyPrefix,

    /// Tree keys must contain at least one byte.
    #[error("empty keys are not allowed")]
    EmptyKey,

    /// The requested version was never committed.
    #[error("version {requested} does not exist (latest: {})", .latest.map_or_else(|| "none".to_string(), |v| v.to_string()))]
    VersionNotFound {
        requested: Version,
        latest: Option<Version>,
    },

    /// Stored tree records are inconsistent.
    #[error("corrupt tree: {0}")]
    Corrupt(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
