//! Whole-store statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statediff_store::{KvStore, StoreError};
use tracing::debug;

use crate::error::CompareResult;

/// Key count and first-byte histogram of a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Total number of keys.
    pub count: u64,
    /// Keys bucketed by their first byte.
    pub prefix_histogram: BTreeMap<u8, u64>,
}

impl Stats {
    /// Count every key in `store` in a single pass.
    pub fn collect(store: &dyn KvStore) -> CompareResult<Self> {
        let mut stats = Self::default();
        for item in store.iter_all()? {
            let (key, _) = item?;
            let first = *key.first().ok_or(StoreError::EmptyKey)?;
            *stats.prefix_histogram.entry(first).or_insert(0) += 1;
            stats.count += 1;
        }
        debug!(count = stats.count, buckets = stats.prefix_histogram.len(), "collected store stats");
        Ok(stats)
    }

    /// Histogram keyed by a printable label: the character itself for
    /// visible ASCII, `0x..` otherwise.
    pub fn labeled_histogram(&self) -> BTreeMap<String, u64> {
        self.prefix_histogram
            .iter()
            .map(|(byte, count)| (byte_label(*byte), *count))
            .collect()
    }
}

fn byte_label(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        char::from(byte).to_string()
    } else {
        format!("0x{byte:02x}")
    }
}
