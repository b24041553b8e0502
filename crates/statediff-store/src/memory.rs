use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::map::OrderedMap;
use crate::traits::{KvIter, KvStore};

/// In-memory, `BTreeMap`-based ordered store.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`
/// for safe concurrent access and cloned on read.
pub struct MemoryStore {
    map: OrderedMap,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            map: OrderedMap::new(BTreeMap::new()),
        }
    }

    /// Create a store pre-populated with `entries`.
    ///
    /// Empty keys are rejected.
    pub fn from_entries<K, V, I>(entries: I) -> StoreResult<Self>
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in entries {
            let key = key.into();
            if key.is_empty() {
                return Err(StoreError::EmptyKey);
            }
            map.insert(key, value.into());
        }
        Ok(Self {
            map: OrderedMap::new(map),
        })
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.map.read()?.get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.map.read()?.contains_key(key))
    }

    fn iter_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>> {
        self.map.cursor(start, end)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.map.write()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.map.write()?.remove(key).is_some())
    }

    fn close(&self) -> StoreResult<()> {
        self.map.mark_closed();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("key_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(iter: KvIter<'_>) -> Vec<(Vec<u8>, Vec<u8>)> {
        iter.collect::<StoreResult<Vec<_>>>().unwrap()
    }

    fn keys(iter: KvIter<'_>) -> Vec<Vec<u8>> {
        collect(iter).into_iter().map(|(k, _)| k).collect()
    }

    // -----------------------------------------------------------------------
    // Point operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_get_has() {
        let store = MemoryStore::new();
        store.put(b"a", b"1").unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(store.has(b"a").unwrap());
        assert!(!store.has(b"b").unwrap());
        assert_eq!(store.get(b"b").unwrap(), None);
    }

    #[test]
    fn put_overwrites() {
        let store = MemoryStore::new();
        store.put(b"a", b"1").unwrap();
        store.put(b"a", b"2").unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_reports_presence() {
        let store = MemoryStore::new();
        store.put(b"a", b"1").unwrap();
        assert!(store.delete(b"a").unwrap());
        assert!(!store.delete(b"a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn empty_key_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(store.put(b"", b"x"), Err(StoreError::EmptyKey)));
        assert!(matches!(
            MemoryStore::from_entries([(b"".to_vec(), b"x".to_vec())]),
            Err(StoreError::EmptyKey)
        ));
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    #[test]
    fn iteration_is_ascending() {
        let store = MemoryStore::from_entries([("c", "3"), ("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(
            keys(store.iter_all().unwrap()),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn range_bounds_are_half_open() {
        let store = MemoryStore::from_entries([("a", ""), ("b", ""), ("c", ""), ("d", "")]).unwrap();
        let got = keys(store.iter_range(Some(b"b".as_slice()), Some(b"d".as_slice())).unwrap());
        assert_eq!(got, vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let store = MemoryStore::from_entries([("a", ""), ("z", "")]).unwrap();
        assert!(keys(store.iter_range(Some(b"z".as_slice()), Some(b"a".as_slice())).unwrap()).is_empty());
        assert!(keys(store.iter_range(Some(b"m".as_slice()), Some(b"m".as_slice())).unwrap()).is_empty());
    }

    #[test]
    fn prefix_iteration() {
        let store =
            MemoryStore::from_entries([("s/k:bank/a", ""), ("s/k:bank/b", ""), ("s/k:gov/a", "")])
                .unwrap();
        let got = keys(store.iter_prefix(b"s/k:bank/").unwrap());
        assert_eq!(got, vec![b"s/k:bank/a".to_vec(), b"s/k:bank/b".to_vec()]);
    }

    #[test]
    fn iteration_is_restartable() {
        let store = MemoryStore::from_entries([("a", "1"), ("b", "2")]).unwrap();
        let first = collect(store.iter_all().unwrap());
        let second = collect(store.iter_all().unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn iteration_does_not_block_writers() {
        let store = MemoryStore::from_entries([("a", "1"), ("c", "3")]).unwrap();
        let mut iter = store.iter_all().unwrap();
        assert_eq!(iter.next().unwrap().unwrap().0, b"a".to_vec());
        store.put(b"b", b"2").unwrap();
        assert_eq!(iter.next().unwrap().unwrap().0, b"b".to_vec());
        assert_eq!(iter.next().unwrap().unwrap().0, b"c".to_vec());
        assert!(iter.next().is_none());
    }

    // -----------------------------------------------------------------------
    // Close
    // -----------------------------------------------------------------------

    #[test]
    fn closed_store_rejects_operations() {
        let store = MemoryStore::from_entries([("a", "1")]).unwrap();
        store.close().unwrap();
        assert!(matches!(store.get(b"a"), Err(StoreError::Closed)));
        assert!(matches!(store.iter_all(), Err(StoreError::Closed)));
        assert!(matches!(store.put(b"b", b"2"), Err(StoreError::Closed)));
        // Second close is a no-op.
        store.close().unwrap();
    }

    #[test]
    fn close_during_iteration_surfaces_error() {
        let store = MemoryStore::from_entries([("a", "1"), ("b", "2")]).unwrap();
        let mut iter = store.iter_all().unwrap();
        assert!(iter.next().unwrap().is_ok());
        store.close().unwrap();
        assert!(matches!(iter.next(), Some(Err(StoreError::Closed))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::from_entries([("shared", "data")]).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    assert_eq!(store.get(b"shared").unwrap(), Some(b"data".to_vec()));
                    assert_eq!(store.iter_all().unwrap().count(), 1);
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = MemoryStore::from_entries([("x", "y")]).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("MemoryStore"));
        assert!(debug.contains("key_count"));
    }
}
