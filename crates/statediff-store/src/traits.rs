use std::sync::Arc;

use crate::error::StoreResult;

/// A single `(key, value)` entry yielded by store iteration.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Lazy, finite, ascending iteration over store entries.
///
/// Each call to [`KvStore::iter_range`] starts a fresh iterator. An `Err`
/// item ends the iteration; callers should stop consuming on the first one.
pub type KvIter<'a> = Box<dyn Iterator<Item = StoreResult<KvPair>> + 'a>;

/// A write applied as part of [`KvStore::write_batch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered byte-keyed store.
///
/// All implementations must satisfy these invariants:
/// - Iteration yields keys in ascending byte order.
/// - `start` bounds are inclusive, `end` bounds exclusive; `None` is unbounded.
/// - Keys are never empty.
/// - Concurrent readers are safe.
/// - After `close()` every operation returns [`StoreError::Closed`](crate::StoreError::Closed).
pub trait KvStore: Send + Sync {
    /// Point lookup. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Existence check.
    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterate entries with `start <= key < end`.
    fn iter_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>>;

    /// Insert or overwrite a key.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Remove a key. Returns `true` if it existed.
    fn delete(&self, key: &[u8]) -> StoreResult<bool>;

    /// Close the store. Closing twice is a no-op.
    fn close(&self) -> StoreResult<()>;

    /// Iterate the whole key space.
    fn iter_all(&self) -> StoreResult<KvIter<'_>> {
        self.iter_range(None, None)
    }

    /// Iterate every key starting with `prefix`.
    fn iter_prefix(&self, prefix: &[u8]) -> StoreResult<KvIter<'_>> {
        let end = prefix_end(prefix);
        self.iter_range(Some(prefix), end.as_deref())
    }

    /// Apply several writes in order.
    ///
    /// Default implementation applies each op individually. Backends may
    /// override to reduce I/O.
    fn write_batch(&self, ops: &[BatchOp]) -> StoreResult<()> {
        for op in ops {
            match op {
                BatchOp::Put { key, value } => self.put(key, value)?,
                BatchOp::Delete { key } => {
                    self.delete(key)?;
                }
            }
        }
        Ok(())
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).has(key)
    }

    fn iter_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>> {
        (**self).iter_range(start, end)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).delete(key)
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }

    fn write_batch(&self, ops: &[BatchOp]) -> StoreResult<()> {
        (**self).write_batch(ops)
    }
}

/// Smallest key greater than every key starting with `prefix`.
///
/// Returns `None` when no such key exists (empty prefix or all `0xff`).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
