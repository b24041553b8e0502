use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::traits::{KvIter, KvPair};

/// Ordered map behind [`MemoryStore`](crate::MemoryStore), plus its closed flag.
pub(crate) struct OrderedMap {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl OrderedMap {
    pub(crate) fn new(entries: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            entries: RwLock::new(entries),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Mark closed. Returns `false` if it already was.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.ensure_open()?;
        self.entries.read().map_err(|_| StoreError::LockPoisoned)
    }

    pub(crate) fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.ensure_open()?;
        self.entries.write().map_err(|_| StoreError::LockPoisoned)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub(crate) fn cursor(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>> {
        self.ensure_open()?;
        Ok(Box::new(Cursor {
            map: self,
            from: match start {
                Some(key) => Bound::Included(key.to_vec()),
                None => Bound::Unbounded,
            },
            end: end.map(<[u8]>::to_vec),
            done: false,
        }))
    }
}

/// Range cursor that re-acquires the read lock for every step.
///
/// No guard is held between items, so writers are never blocked by a slow
/// consumer. Each step seeks past the last key returned.
struct Cursor<'a> {
    map: &'a OrderedMap,
    from: Bound<Vec<u8>>,
    end: Option<Vec<u8>>,
    done: bool,
}

impl Cursor<'_> {
    fn step(&mut self) -> StoreResult<Option<KvPair>> {
        let map = self.map.read()?;

        let lower = match &self.from {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let upper = match &self.end {
            Some(k) => Bound::Excluded(k.as_slice()),
            None => Bound::Unbounded,
        };

        // BTreeMap::range panics on inverted bounds.
        if let (Bound::Included(lo) | Bound::Excluded(lo), Bound::Excluded(hi)) = (lower, upper) {
            if lo >= hi {
                return Ok(None);
            }
        }

        let next = map
            .range::<[u8], _>((lower, upper))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(next)
    }
}

impl Iterator for Cursor<'_> {
    type Item = StoreResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some((key, value))) => {
                self.from = Bound::Excluded(key.clone());
                Some(Ok((key, value)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
