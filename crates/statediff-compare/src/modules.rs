//! Module discovery.
//!
//! Modules are found by scanning store keys in `s/a..s/z` and extracting
//! the name from keys shaped `s/k:<name>/...`. Anything else in that range
//! is skipped.

use std::collections::BTreeSet;

use statediff_store::KvStore;
use statediff_types::MODULE_KEY_PREFIX;
use tracing::debug;

use crate::error::CompareResult;

/// Inclusive lower bound of the discovery scan.
pub const DISCOVERY_RANGE_START: &[u8] = b"s/a";
/// Exclusive upper bound of the discovery scan.
pub const DISCOVERY_RANGE_END: &[u8] = b"s/z";

/// Extract the module name from a key shaped `s/k:<name>/...`.
///
/// Returns `None` for keys without the module prefix, without a `/` after
/// the name, with an empty name, or with a name that is not UTF-8.
pub fn module_name(key: &[u8]) -> Option<&str> {
    let rest = key.strip_prefix(MODULE_KEY_PREFIX)?;
    let end = rest.iter().position(|&b| b == b'/')?;
    let name = &rest[..end];
    if name.is_empty() {
        return None;
    }
    std::str::from_utf8(name).ok()
}

/// List the distinct module names stored in `store`, sorted ascending.
pub fn discover_modules(store: &dyn KvStore) -> CompareResult<Vec<String>> {
    let mut modules = BTreeSet::new();
    let mut skipped = 0u64;

    for item in store.iter_range(Some(DISCOVERY_RANGE_START), Some(DISCOVERY_RANGE_END))? {
        let (key, _) = item?;
        match module_name(&key) {
            Some(name) => {
                if !modules.contains(name) {
                    modules.insert(name.to_string());
                }
            }
            None => {
                skipped += 1;
                debug!(key = %String::from_utf8_lossy(&key), "skipping non-module key");
            }
        }
    }

    debug!(modules = modules.len(), skipped, "module discovery complete");
    Ok(modules.into_iter().collect())
}

/// Modules present in both stores, sorted ascending.
pub fn common_modules(left: &dyn KvStore, right: &dyn KvStore) -> CompareResult<Vec<String>> {
    let left = discover_modules(left)?;
    let right: BTreeSet<String> = discover_modules(right)?.into_iter().collect();
    Ok(left.into_iter().filter(|m| right.contains(m)).collect())
}
