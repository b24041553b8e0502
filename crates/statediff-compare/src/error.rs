//! Error types for the comparison crate.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use statediff_store::StoreError;
use statediff_tree::TreeError;
use statediff_types::{TypeError, Version};

/// Which of the two compared stores an error or value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Errors surfaced by comparison operations.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// A store location or configuration value is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// One of the trees has no committed version.
    #[error("no versions available in {side} tree")]
    NoVersions { side: Side },

    /// The trees share no committed version.
    #[error(
        "the two trees have no version in common\n\
         available versions in the left db: {left:?}\n\
         available versions in the right db: {right:?}"
    )]
    NoCommonVersion {
        left: Vec<Version>,
        right: Vec<Version>,
    },

    /// A diff was requested between trees loaded at different versions.
    #[error("loaded versions differ: left {left}, right {right}")]
    VersionMismatch { left: Version, right: Version },

    /// Trees must be scoped to a non-empty prefix.
    #[error("tree prefix cannot be empty")]
    EmptyPrefix,

    /// The module name cannot form a namespace.
    #[error("invalid module: {0}")]
    Module(#[from] TypeError),

    /// Opening one side of the pair failed.
    #[error("opening {side} store {}: {source}", .location.display())]
    Open {
        side: Side,
        location: PathBuf,
        source: StoreError,
    },

    /// Iteration or lookup against a store failed.
    #[error("store I/O error: {0}")]
    Store(#[from] StoreError),

    /// Loading a tree failed.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

impl CompareError {
    /// Returns `true` for failures of the underlying storage (open, iterate,
    /// lookup, load), as opposed to configuration or version problems.
    pub fn is_store_io(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Store(_) | Self::Tree(_))
    }
}

/// Convenience alias for comparison results.
pub type CompareResult<T> = Result<T, CompareError>;

/// Failures from closing both stores of a pair.
///
/// Both sides are always closed; each side's failure is kept.
#[derive(Debug, thiserror::Error)]
#[error("{}", describe_close(.left, .right))]
pub struct CloseError {
    pub left: Option<StoreError>,
    pub right: Option<StoreError>,
}

impl CloseError {
    /// Combine per-side close results, returning `Ok` when both succeeded.
    pub fn join(left: Result<(), StoreError>, right: Result<(), StoreError>) -> Result<(), Self> {
        match (left, right) {
            (Ok(()), Ok(())) => Ok(()),
            (left, right) => Err(Self {
                left: left.err(),
                right: right.err(),
            }),
        }
    }
}

fn describe_close(left: &Option<StoreError>, right: &Option<StoreError>) -> String {
    let parts: Vec<String> = [(Side::Left, left), (Side::Right, right)]
        .into_iter()
        .filter_map(|(side, err)| err.as_ref().map(|e| format!("closing {side} store: {e}")))
        .collect();
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_ok_when_both_close() {
        assert!(CloseError::join(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn join_keeps_both_failures() {
        let err = CloseError::join(Err(StoreError::Closed), Err(StoreError::LockPoisoned)).unwrap_err();
        assert!(err.left.is_some());
        assert!(err.right.is_some());
        let message = err.to_string();
        assert!(message.contains("closing left store: store is closed"));
        assert!(message.contains("closing right store: store lock poisoned"));
    }

    #[test]
    fn join_single_failure() {
        let err = CloseError::join(Ok(()), Err(StoreError::Closed)).unwrap_err();
        assert!(err.left.is_none());
        assert_eq!(err.to_string(), "closing right store: store is closed");
    }

    #[test]
    fn no_common_version_lists_both_sides() {
        let err = CompareError::NoCommonVersion {
            left: vec![1, 2],
            right: vec![5],
        };
        let message = err.to_string();
        assert!(message.contains("left db: [1, 2]"));
        assert!(message.contains("right db: [5]"));
    }

    #[test]
    fn store_io_classification() {
        assert!(CompareError::Store(StoreError::Closed).is_store_io());
        assert!(!CompareError::NoVersions { side: Side::Left }.is_store_io());
        assert!(!CompareError::Config("x".into()).is_store_io());
    }
}
