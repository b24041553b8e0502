//! The left/right store pair and per-module comparison.

use serde::{Deserialize, Serialize};
use statediff_store::{KvStore, RocksStore};
use statediff_tree::{ImmutableTree, TreeView};
use statediff_types::{ModulePrefix, RootHash, Version, LATEST_VERSION};
use tracing::{info, warn};

use crate::diff::{diff, DiffOutcome};
use crate::error::{CloseError, CompareError, CompareResult, Side};
use crate::location::StoreLocation;
use crate::modules::common_modules;
use crate::reconcile::reconcile;
use crate::stats::Stats;

/// Two stores opened for comparison.
///
/// The pair is shared read-only by every operation and closed once, at
/// shutdown. All methods take `&self`, so a pair can sit behind an `Arc`.
pub struct StorePair {
    left: Box<dyn KvStore>,
    right: Box<dyn KvStore>,
}

impl StorePair {
    /// Wrap two already-open stores.
    pub fn new(left: impl KvStore + 'static, right: impl KvStore + 'static) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Open both stores from disk, read-only. If the right store fails to
    /// open, the left one is closed before returning.
    pub fn open(left: &StoreLocation, right: &StoreLocation) -> CompareResult<Self> {
        let left_store = open_side(Side::Left, left)?;
        let right_store = match open_side(Side::Right, right) {
            Ok(store) => store,
            Err(e) => {
                if let Err(close_err) = left_store.close() {
                    warn!(error = %close_err, "closing left store after failed open");
                }
                return Err(e);
            }
        };
        info!(left = %left, right = %right, "opened store pair");
        Ok(Self::new(left_store, right_store))
    }

    pub fn left(&self) -> &dyn KvStore {
        self.left.as_ref()
    }

    pub fn right(&self) -> &dyn KvStore {
        self.right.as_ref()
    }

    /// Key statistics for each store.
    pub fn stats(&self) -> CompareResult<(Stats, Stats)> {
        Ok((Stats::collect(self.left())?, Stats::collect(self.right())?))
    }

    /// Modules present in both stores.
    pub fn modules(&self) -> CompareResult<Vec<String>> {
        common_modules(self.left(), self.right())
    }

    /// Load both trees under `prefix` at `version` (`0` for each side's
    /// latest).
    pub fn load_trees(&self, version: Version, prefix: &[u8]) -> CompareResult<TreePair<'_>> {
        if prefix.is_empty() {
            return Err(CompareError::EmptyPrefix);
        }
        let left = ImmutableTree::load(self.left(), prefix, version)?;
        let right = ImmutableTree::load(self.right(), prefix, version)?;
        Ok(TreePair { left, right })
    }

    /// Committed versions of a module on each side and their highest common
    /// version, if any.
    pub fn module_versions(&self, module: &str) -> CompareResult<ModuleVersions> {
        let prefix = ModulePrefix::new(module)?;
        let trees = self.load_trees(LATEST_VERSION, prefix.as_bytes())?;
        let (common, reconcile_error) = match trees.reconcile() {
            Ok(version) => (Some(version), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Ok(ModuleVersions {
            module: module.to_string(),
            left: trees.left.available_versions().to_vec(),
            right: trees.right.available_versions().to_vec(),
            common,
            reconcile_error,
        })
    }

    /// Latest version and live key count of a module on each side. Only the
    /// version records are read; key counts come from the committed sizes.
    pub fn module_summary(&self, module: &str) -> CompareResult<ModuleSummary> {
        let prefix = ModulePrefix::new(module)?;
        let trees = self.load_trees(LATEST_VERSION, prefix.as_bytes())?;
        Ok(ModuleSummary {
            module: module.to_string(),
            left_version: trees.left.version(),
            right_version: trees.right.version(),
            left_keys: trees.left.len(),
            right_keys: trees.right.len(),
        })
    }

    /// Reconcile a module's versions and diff both trees at the highest
    /// common version.
    pub fn compare_module(&self, module: &str) -> CompareResult<ModuleReport> {
        let prefix = ModulePrefix::new(module)?;
        let latest = self.load_trees(LATEST_VERSION, prefix.as_bytes())?;
        let version = latest.reconcile()?;

        let trees = if latest.left.version() == version && latest.right.version() == version {
            latest
        } else {
            self.load_trees(version, prefix.as_bytes())?
        };

        let outcome = trees.diff()?;
        let (left_hash, right_hash) = trees.hashes();
        info!(
            module,
            version,
            identical = outcome.is_identical(),
            "compared module"
        );
        Ok(ModuleReport {
            module: module.to_string(),
            version,
            left_hash,
            right_hash,
            outcome,
        })
    }

    /// Close both stores. Both are always attempted.
    pub fn close(&self) -> Result<(), CloseError> {
        let result = CloseError::join(self.left.close(), self.right.close());
        match &result {
            Ok(()) => info!("closed store pair"),
            Err(e) => warn!(error = %e, "store pair closed with errors"),
        }
        result
    }
}

impl std::fmt::Debug for StorePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePair").finish_non_exhaustive()
    }
}

fn open_side(side: Side, location: &StoreLocation) -> CompareResult<RocksStore> {
    RocksStore::open(location.path()).map_err(|source| CompareError::Open {
        side,
        location: location.path().to_path_buf(),
        source,
    })
}

/// One module's trees loaded from both stores.
#[derive(Debug)]
pub struct TreePair<'a> {
    pub left: ImmutableTree<'a>,
    pub right: ImmutableTree<'a>,
}

impl TreePair<'_> {
    /// Highest version committed on both sides.
    pub fn reconcile(&self) -> CompareResult<Version> {
        reconcile(self.left.available_versions(), self.right.available_versions())
    }

    /// Root hashes of the loaded versions.
    pub fn hashes(&self) -> (RootHash, RootHash) {
        (self.left.root_hash(), self.right.root_hash())
    }

    /// The version both trees are loaded at.
    pub fn version(&self) -> CompareResult<Version> {
        let (left, right) = (self.left.version(), self.right.version());
        if left != right {
            return Err(CompareError::VersionMismatch { left, right });
        }
        Ok(left)
    }

    /// Diff the trees. Both must be loaded at the same version.
    pub fn diff(&self) -> CompareResult<DiffOutcome> {
        self.version()?;
        diff(&self.left, &self.right)
    }
}

/// Version listing for one module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersions {
    pub module: String,
    pub left: Vec<Version>,
    pub right: Vec<Version>,
    pub common: Option<Version>,
    /// Why no common version exists, when `common` is `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile_error: Option<String>,
}

/// Latest state of one module on both sides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module: String,
    pub left_version: Version,
    pub right_version: Version,
    pub left_keys: u64,
    pub right_keys: u64,
}

/// Outcome of comparing one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleReport {
    pub module: String,
    /// The reconciled version both trees were compared at.
    pub version: Version,
    pub left_hash: RootHash,
    pub right_hash: RootHash,
    pub outcome: DiffOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use statediff_store::{KvIter, MemoryStore, StoreError, StoreResult};
    use statediff_tree::MutableTree;
    use std::collections::BTreeMap;
    use std::path::Path;

    /// Commit each batch of `(key, value)` writes as one version of `module`.
    fn commit(store: &MemoryStore, module: &str, versions: &[&[(&str, &str)]]) {
        let prefix = ModulePrefix::new(module).unwrap();
        let mut tree = MutableTree::open(store, prefix.as_bytes()).unwrap();
        for writes in versions {
            for (k, v) in *writes {
                tree.set(k.as_bytes(), v.as_bytes()).unwrap();
            }
            tree.save_version().unwrap();
        }
    }

    // ------------------------------------------------------------------
    // Trees
    // ------------------------------------------------------------------

    #[test]
    fn load_trees_rejects_empty_prefix() {
        let pair = StorePair::new(MemoryStore::new(), MemoryStore::new());
        assert!(matches!(pair.load_trees(0, b""), Err(CompareError::EmptyPrefix)));
    }

    #[test]
    fn load_trees_at_latest() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")], &[("b", "2")]]);
        commit(&right, "bank", &[&[("a", "1")]]);
        let pair = StorePair::new(left, right);
        let trees = pair.load_trees(0, b"s/k:bank/").unwrap();
        assert_eq!(trees.left.version(), 2);
        assert_eq!(trees.right.version(), 1);
        assert_eq!(trees.reconcile().unwrap(), 1);
    }

    #[test]
    fn diff_refuses_mismatched_versions() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")], &[("b", "2")]]);
        commit(&right, "bank", &[&[("a", "1")]]);
        let pair = StorePair::new(left, right);
        let trees = pair.load_trees(0, b"s/k:bank/").unwrap();
        assert!(matches!(
            trees.diff(),
            Err(CompareError::VersionMismatch { left: 2, right: 1 })
        ));
    }

    // ------------------------------------------------------------------
    // compare_module
    // ------------------------------------------------------------------

    #[test]
    fn compares_at_highest_common_version() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")], &[("b", "2")], &[("c", "3")]]);
        commit(&right, "bank", &[&[("a", "1")], &[("b", "2")]]);
        let pair = StorePair::new(left, right);

        let report = pair.compare_module("bank").unwrap();
        assert_eq!(report.version, 2);
        assert_eq!(report.outcome, DiffOutcome::Identical);
        assert_eq!(report.left_hash, report.right_hash);
    }

    #[test]
    fn reports_divergence() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1"), ("b", "2")]]);
        commit(&right, "bank", &[&[("a", "1"), ("b", "3"), ("c", "4")]]);
        let pair = StorePair::new(left, right);

        let report = pair.compare_module("bank").unwrap();
        let result = report.outcome.key_diff().expect("diverged");
        assert_eq!(result.differing, vec![b"b".to_vec()]);
        assert_eq!(result.only_right, vec![b"c".to_vec()]);
        assert!(result.only_left.is_empty());
    }

    #[test]
    fn reports_hash_mismatch_only() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")], &[("b", "2")]]);
        commit(&right, "bank", &[&[("a", "1"), ("b", "2")], &[]]);
        let pair = StorePair::new(left, right);

        let report = pair.compare_module("bank").unwrap();
        assert_eq!(report.version, 2);
        assert_eq!(report.outcome, DiffOutcome::HashMismatchOnly);
        assert_ne!(report.left_hash, report.right_hash);
    }

    #[test]
    fn no_common_version() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")]]);
        let pair = StorePair::new(left, right);
        assert!(matches!(
            pair.compare_module("bank"),
            Err(CompareError::NoVersions { side: Side::Right })
        ));
    }

    #[test]
    fn invalid_module_name() {
        let pair = StorePair::new(MemoryStore::new(), MemoryStore::new());
        assert!(matches!(pair.compare_module(""), Err(CompareError::Module(_))));
        assert!(matches!(pair.compare_module("a/b"), Err(CompareError::Module(_))));
    }

    #[test]
    fn module_isolation() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")]]);
        commit(&right, "bank", &[&[("a", "1")]]);
        commit(&left, "acc", &[&[("x", "1")]]);
        commit(&right, "acc", &[&[("x", "2")]]);
        let pair = StorePair::new(left, right);

        assert!(pair.compare_module("bank").unwrap().outcome.is_identical());
        assert!(!pair.compare_module("acc").unwrap().outcome.is_identical());
        assert_eq!(pair.modules().unwrap(), vec!["acc", "bank"]);
    }

    #[test]
    fn module_versions_lists_both_sides() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")], &[("a", "2")], &[("a", "3")]]);
        commit(&right, "bank", &[&[("a", "1")]]);
        let pair = StorePair::new(left, right);

        let versions = pair.module_versions("bank").unwrap();
        assert_eq!(versions.left, vec![1, 2, 3]);
        assert_eq!(versions.right, vec![1]);
        assert_eq!(versions.common, Some(1));
        assert_eq!(versions.reconcile_error, None);
    }

    #[test]
    fn module_versions_explains_missing_common() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1")]]);
        let pair = StorePair::new(left, right);

        let versions = pair.module_versions("bank").unwrap();
        assert_eq!(versions.common, None);
        assert!(versions.reconcile_error.unwrap().contains("no versions available in right"));
    }

    #[test]
    fn module_summary_counts_live_keys() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1"), ("b", "1")], &[("c", "1")]]);
        commit(&right, "bank", &[&[("a", "1")]]);
        let pair = StorePair::new(left, right);

        let summary = pair.module_summary("bank").unwrap();
        assert_eq!((summary.left_version, summary.right_version), (2, 1));
        assert_eq!((summary.left_keys, summary.right_keys), (3, 1));
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    #[test]
    fn stats_for_both_sides() {
        let left = MemoryStore::from_entries([("aa", ""), ("ab", "")]).unwrap();
        let right = MemoryStore::from_entries([("ba", "")]).unwrap();
        let pair = StorePair::new(left, right);
        let (l, r) = pair.stats().unwrap();
        assert_eq!(l.count, 2);
        assert_eq!(r.count, 1);
    }

    #[test]
    fn close_then_operations_fail() {
        let pair = StorePair::new(MemoryStore::new(), MemoryStore::new());
        pair.close().unwrap();
        assert!(pair.stats().unwrap_err().is_store_io());
        assert!(pair.close().is_ok());
    }

    #[test]
    fn open_requires_existing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let left_path = dir.path().join("left.db");
        RocksStore::create(&left_path).unwrap().close().unwrap();

        let left = StoreLocation::parse(left_path.to_str().unwrap()).unwrap();
        let right = StoreLocation::parse(dir.path().join("right.db").to_str().unwrap()).unwrap();
        match StorePair::open(&left, &right) {
            Err(CompareError::Open { side, source, .. }) => {
                assert_eq!(side, Side::Right);
                assert!(matches!(source, StoreError::NotFound(_)));
            }
            other => panic!("expected open failure, got {other:?}"),
        }
    }

    #[test]
    fn close_reports_both_failures() {
        let pair = StorePair::new(FailingClose::default(), FailingClose::default());
        let err = pair.close().unwrap_err();
        assert!(err.left.is_some());
        assert!(err.right.is_some());
        assert!(err.to_string().contains("left"));
        assert!(err.to_string().contains("right"));
    }

    #[test]
    fn store_failure_during_diff_aborts() {
        let (left, right) = (MemoryStore::new(), MemoryStore::new());
        commit(&left, "bank", &[&[("a", "1"), ("b", "2")]]);
        commit(&right, "bank", &[&[("a", "1"), ("b", "3")]]);
        let pair = StorePair::new(left, right);

        let trees = pair.load_trees(1, b"s/k:bank/").unwrap();
        pair.right().close().unwrap();
        assert!(trees.diff().unwrap_err().is_store_io());
    }

    // ------------------------------------------------------------------
    // On disk
    // ------------------------------------------------------------------

    #[test]
    fn open_requires_existing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let left_path = dir.path().join("left.db");
        RocksStore::create(&left_path).unwrap().close().unwrap();

        let left = StoreLocation::parse(left_path.to_str().unwrap()).unwrap();
        let right = StoreLocation::parse(dir.path().join("right.db").to_str().unwrap()).unwrap();
        match StorePair::open(&left, &right) {
            Err(CompareError::Open { side, source, .. }) => {
                assert_eq!(side, Side::Right);
                assert!(matches!(source, StoreError::NotFound(_)));
            }
            other => panic!("expected open failure, got {other:?}"),
        }
        assert!(!dir.path().join("right.db").exists());
    }

    #[test]
    fn open_rejects_foreign_directory_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("application.db");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("CURRENT"), b"MANIFEST-000004\n").unwrap();
        std::fs::write(path.join("000005.ldb"), [0x5au8; 64]).unwrap();
        let before = listing(&path);

        let location = StoreLocation::parse(path.to_str().unwrap()).unwrap();
        match StorePair::open(&location, &location) {
            Err(CompareError::Open { side, .. }) => assert_eq!(side, Side::Left),
            other => panic!("expected open failure, got {other:?}"),
        }
        assert_eq!(listing(&path), before);
    }

    #[test]
    fn open_and_compare_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let left_path = dir.path().join("left.db");
        let right_path = dir.path().join("right.db");
        for path in [&left_path, &right_path] {
            let store = RocksStore::create(path).unwrap();
            commit_rocks(&store);
            store.close().unwrap();
        }
        let before = (listing(&left_path), listing(&right_path));

        let left = StoreLocation::parse(left_path.to_str().unwrap()).unwrap();
        let right = StoreLocation::parse(right_path.to_str().unwrap()).unwrap();
        let pair = StorePair::open(&left, &right).unwrap();
        assert_eq!(pair.modules().unwrap(), vec!["bank"]);
        assert!(pair.compare_module("bank").unwrap().outcome.is_identical());
        assert_eq!(pair.module_summary("bank").unwrap().left_keys, 1);
        pair.close().unwrap();
        drop(pair);

        assert_eq!((listing(&left_path), listing(&right_path)), before);
    }

    fn commit_rocks(store: &RocksStore) {
        let mut tree = MutableTree::open(store, b"s/k:bank/").unwrap();
        tree.set(b"a", b"1").unwrap();
        tree.save_version().unwrap();
    }

    /// File names and sizes directly inside `dir`.
    fn listing(dir: &Path) -> BTreeMap<String, u64> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                let name = entry.file_name().to_string_lossy().into_owned();
                (name, entry.metadata().unwrap().len())
            })
            .collect()
    }

    /// Empty store whose `close` always fails.
    #[derive(Default)]
    struct FailingClose(MemoryStore);

    impl KvStore for FailingClose {
        fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
            self.0.get(key)
        }

        fn iter_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>> {
            self.0.iter_range(start, end)
        }

        fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
            self.0.put(key, value)
        }

        fn delete(&self, key: &[u8]) -> StoreResult<bool> {
            self.0.delete(key)
        }

        fn close(&self) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("device went away")))
        }
    }
}
