//! Key-level diff between two loaded trees.

use statediff_tree::TreeView;
use tracing::{debug, warn};

use crate::error::CompareResult;

/// Keys that differ between two trees, each list in ascending key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyDiff {
    /// Present only in the left tree.
    pub only_left: Vec<Vec<u8>>,
    /// Present only in the right tree.
    pub only_right: Vec<Vec<u8>>,
    /// Present in both with different values.
    pub differing: Vec<Vec<u8>>,
}

impl KeyDiff {
    pub fn is_empty(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty() && self.differing.is_empty()
    }

    /// Total number of reported keys.
    pub fn len(&self) -> usize {
        self.only_left.len() + self.only_right.len() + self.differing.len()
    }
}

/// Result of comparing two trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Root hashes are equal.
    Identical,
    /// Root hashes differ but every key and value matches. Happens when the
    /// same content was reached through a different history.
    HashMismatchOnly,
    /// At least one key is missing on a side or carries a different value.
    Diverged(KeyDiff),
}

impl DiffOutcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, Self::Identical)
    }

    /// The key diff, if the trees diverged.
    pub fn key_diff(&self) -> Option<&KeyDiff> {
        match self {
            Self::Diverged(diff) => Some(diff),
            _ => None,
        }
    }
}

/// Compare two trees.
///
/// Equal root hashes short-circuit to [`DiffOutcome::Identical`] without
/// iterating. Otherwise the left tree is walked once with point lookups into
/// the right, then the right tree is walked once with existence checks into
/// the left. Any read failure aborts the diff.
pub fn diff<L, R>(left: &L, right: &R) -> CompareResult<DiffOutcome>
where
    L: TreeView + ?Sized,
    R: TreeView + ?Sized,
{
    if left.root_hash() == right.root_hash() {
        debug!(root = %left.root_hash().short_hex(), "root hashes match");
        return Ok(DiffOutcome::Identical);
    }

    let mut result = KeyDiff::default();

    for item in left.iter() {
        let (key, value) = item?;
        match right.get(&key)? {
            None => result.only_left.push(key),
            Some(other) if other != value => result.differing.push(key),
            Some(_) => {}
        }
    }

    for item in right.iter() {
        let (key, _) = item?;
        if !left.has(&key)? {
            result.only_right.push(key);
        }
    }

    if result.is_empty() {
        warn!(
            left = %left.root_hash().short_hex(),
            right = %right.root_hash().short_hex(),
            "keys and values match but root hashes differ"
        );
        return Ok(DiffOutcome::HashMismatchOnly);
    }

    debug!(
        only_left = result.only_left.len(),
        only_right = result.only_right.len(),
        differing = result.differing.len(),
        "trees diverged"
    );
    Ok(DiffOutcome::Diverged(result))
}
