//! On-disk store backed by RocksDB.
//!
//! Comparisons only ever use [`RocksStore::open`], which opens the database
//! read-only and leaves the store directory byte-for-byte untouched.
//! [`RocksStore::create`] opens read-write and exists to build stores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rocksdb::{DBIteratorWithThreadMode, IteratorMode, Options, ReadOptions, WriteBatch, DB};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::{BatchOp, KvIter, KvPair, KvStore};

/// Subdirectory of the system temp dir receiving RocksDB info logs for
/// read-only opens.
const INFO_LOG_DIR: &str = "statediff-rocksdb-logs";

/// Ordered store over a RocksDB directory.
pub struct RocksStore {
    dir: PathBuf,
    db: DB,
    read_only: bool,
    closed: AtomicBool,
}

impl RocksStore {
    /// Open an existing store directory read-only.
    ///
    /// Fails if `dir` is missing, is not a directory, or does not hold a
    /// readable RocksDB database. No file is created inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::NotADirectory(dir.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(dir.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        }

        let log_dir = std::env::temp_dir().join(INFO_LOG_DIR);
        fs::create_dir_all(&log_dir)?;

        let mut options = Options::default();
        options.create_if_missing(false);
        options.set_db_log_dir(&log_dir);
        options.set_keep_log_file_num(1);

        let db = DB::open_for_read_only(&options, dir, false)?;
        info!(dir = %dir.display(), "opened store read-only");

        Ok(Self {
            dir: dir.to_path_buf(),
            db,
            read_only: true,
            closed: AtomicBool::new(false),
        })
    }

    /// Open a store directory for writing, creating it if needed.
    pub fn create(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut options = Options::default();
        options.create_if_missing(true);

        let db = DB::open(&options, dir)?;
        info!(dir = %dir.display(), "opened store for writing");

        Ok(Self {
            dir: dir.to_path_buf(),
            db,
            read_only: false,
            closed: AtomicBool::new(false),
        })
    }

    /// Directory holding the store.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        self.ensure_open()?;
        if self.read_only {
            return Err(StoreError::ReadOnly(self.dir.clone()));
        }
        Ok(())
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.db.get(key)?)
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.db.get_pinned(key)?.is_some())
    }

    fn iter_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StoreResult<KvIter<'_>> {
        self.ensure_open()?;

        let mut read_opts = ReadOptions::default();
        if let Some(start) = start {
            read_opts.set_iterate_lower_bound(start.to_vec());
        }
        if let Some(end) = end {
            read_opts.set_iterate_upper_bound(end.to_vec());
        }

        Ok(Box::new(RangeIter {
            store: self,
            inner: self.db.iterator_opt(IteratorMode::Start, read_opts),
            done: false,
        }))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.ensure_writable()?;
        self.db.put(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<bool> {
        self.ensure_writable()?;
        if self.db.get_pinned(key)?.is_none() {
            return Ok(false);
        }
        self.db.delete(key)?;
        Ok(true)
    }

    fn write_batch(&self, ops: &[BatchOp]) -> StoreResult<()> {
        self.ensure_writable()?;

        let mut batch = WriteBatch::default();
        for op in ops {
            match op {
                BatchOp::Put { key, .. } if key.is_empty() => return Err(StoreError::EmptyKey),
                BatchOp::Put { key, value } => batch.put(key, value),
                BatchOp::Delete { key } => batch.delete(key),
            }
        }
        self.db.write(batch)?;
        debug!(ops = ops.len(), "rocksdb batch written");
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if !self.read_only {
            self.db.flush()?;
        }
        info!(dir = %self.dir.display(), "closed store");
        Ok(())
    }
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("dir", &self.dir)
            .field("read_only", &self.read_only)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Bounded RocksDB iterator that stops with [`StoreError::Closed`] once its
/// store is closed.
struct RangeIter<'a> {
    store: &'a RocksStore,
    inner: DBIteratorWithThreadMode<'a, DB>,
    done: bool,
}

impl Iterator for RangeIter<'_> {
    type Item = StoreResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(e) = self.store.ensure_open() {
            self.done = true;
            return Some(Err(e));
        }
        match self.inner.next()? {
            Ok((key, value)) => Some(Ok((key.into_vec(), value.into_vec()))),
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
