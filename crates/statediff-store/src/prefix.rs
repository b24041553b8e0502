use crate::error::{StoreError, StoreResult};
use crate::traits::{prefix_end, BatchOp, KvIter, KvStore};

/// Namespace view over another store.
///
/// Keys passed in are relative to `prefix`; keys yielded by iteration have
/// the prefix stripped. Iteration never leaves the prefix range. Closing a
/// `PrefixStore` does not close the parent.
pub struct PrefixStore<'a> {
    inner: &'a dyn KvStore,
    prefix: Vec<u8>,
}

impl<'a> PrefixStore<'a> {
    /// Wrap `inner`, scoping it to `prefix`. The prefix must not be empty.
    pub fn new(inner: &'a dyn KvStore, prefix: &[u8]) -> StoreResult<Self> {
        if prefix.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        Ok(Self {
            inner,
            prefix: prefix.to_vec(),
        })
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

impl KvStore for PrefixStore<'_> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(&self.full_key(key))
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        self.inner.has(&self.full_key(key))
    }

    fn iter_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>> {
        let lower = self.full_key(start.unwrap_or_default());
        let upper = match end {
            Some(end) => Some(self.full_key(end)),
            None => prefix_end(&self.prefix),
        };
        let strip = self.prefix.len();
        let iter = self
            .inner
            .iter_range(Some(lower.as_slice()), upper.as_deref())?
            .map(move |item| item.map(|(key, value)| (key[strip..].to_vec(), value)));
        Ok(Box::new(iter))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.inner.put(&self.full_key(key), value)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<bool> {
        self.inner.delete(&self.full_key(key))
    }

    fn write_batch(&self, ops: &[BatchOp]) -> StoreResult<()> {
        let scoped: Vec<BatchOp> = ops
            .iter()
            .map(|op| match op {
                BatchOp::Put { key, value } if !key.is_empty() => Ok(BatchOp::Put {
                    key: self.full_key(key),
                    value: value.clone(),
                }),
                BatchOp::Put { .. } => Err(StoreError::EmptyKey),
                BatchOp::Delete { key } => Ok(BatchOp::Delete {
                    key: self.full_key(key),
                }),
            })
            .collect::<StoreResult<_>>()?;
        self.inner.write_batch(&scoped)
    }

    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
