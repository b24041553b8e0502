//! Loaded tree versions and the writer that commits them.
//!
//! An [`ImmutableTree`] is a view over the store, not a copy: loading reads
//! only the version records, and every lookup or iteration goes back to the
//! store's `d` records for the loaded version.

use std::collections::BTreeMap;

use statediff_store::{BatchOp, KvIter, KvStore, PrefixStore};
use statediff_types::{RootHash, Version, LATEST_VERSION};
use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::hash::{changeset_hash, leaf_hash, merkle_root, version_hash, Change};
use crate::layout::{
    data_key, data_key_range, decode_value, encode_value, parse_data_key, parse_version_key,
    version_key, VersionRecord, DATA_TAG, VERSION_TAG,
};

/// Iterator over the live entries of a loaded tree version.
pub type TreeIter<'a> = Box<dyn Iterator<Item = TreeResult<(Vec<u8>, Vec<u8>)>> + 'a>;

/// Read access to one tree version.
///
/// This is the surface the diff engine consumes. Iteration is ascending by
/// key and restartable.
pub trait TreeView {
    /// Version currently loaded; `0` for a tree with no committed versions.
    fn version(&self) -> Version;

    /// Root hash of the loaded version.
    fn root_hash(&self) -> RootHash;

    /// Every committed version, ascending.
    fn available_versions(&self) -> &[Version];

    /// Iterate live entries in ascending key order.
    fn iter(&self) -> TreeIter<'_>;

    /// Point lookup at the loaded version.
    fn get(&self, key: &[u8]) -> TreeResult<Option<Vec<u8>>>;

    /// Existence check at the loaded version.
    fn has(&self, key: &[u8]) -> TreeResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Read-only view of a tree at one committed version, backed by its store.
pub struct ImmutableTree<'a> {
    store: PrefixStore<'a>,
    version: Version,
    root_hash: RootHash,
    available_versions: Vec<Version>,
    size: u64,
}

impl<'a> ImmutableTree<'a> {
    /// Load the tree stored under `prefix` at `version`.
    ///
    /// `version == 0` loads the most recent version. A tree with no
    /// committed versions loads as empty with the zero root hash.
    pub fn load(store: &'a dyn KvStore, prefix: &[u8], version: Version) -> TreeResult<Self> {
        if prefix.is_empty() {
            return Err(TreeError::EmptyPrefix);
        }
        let scoped = PrefixStore::new(store, prefix)?;
        let records = read_version_records(&scoped)?;
        let available_versions: Vec<Version> = records.keys().copied().collect();
        let latest = available_versions.last().copied();

        let target = match (version, latest) {
            (LATEST_VERSION, Some(v)) => v,
            (LATEST_VERSION, None) => {
                debug!(prefix = %String::from_utf8_lossy(prefix), "tree has no versions");
                return Ok(Self {
                    store: scoped,
                    version: 0,
                    root_hash: RootHash::zero(),
                    available_versions,
                    size: 0,
                });
            }
            (v, _) => v,
        };
        let record = records.get(&target).copied().ok_or(TreeError::VersionNotFound {
            requested: target,
            latest,
        })?;

        debug!(
            prefix = %String::from_utf8_lossy(prefix),
            version = target,
            keys = record.size,
            "loaded tree version"
        );
        Ok(Self {
            store: scoped,
            version: target,
            root_hash: record.root_hash,
            available_versions,
            size: record.size,
        })
    }

    /// Number of live keys, as recorded when the version was committed.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl TreeView for ImmutableTree<'_> {
    fn version(&self) -> Version {
        self.version
    }

    fn root_hash(&self) -> RootHash {
        self.root_hash
    }

    fn available_versions(&self) -> &[Version] {
        &self.available_versions
    }

    fn iter(&self) -> TreeIter<'_> {
        if self.version == 0 {
            return Box::new(std::iter::empty());
        }
        match self.store.iter_prefix(&[DATA_TAG]) {
            Ok(records) => Box::new(LiveEntries::new(records, self.version, self.size)),
            Err(e) => Box::new(std::iter::once(Err(TreeError::from(e)))),
        }
    }

    fn get(&self, key: &[u8]) -> TreeResult<Option<Vec<u8>>> {
        if self.version == 0 {
            return Ok(None);
        }
        // Records of one key ascend by version; the last one in range wins.
        let (start, end) = data_key_range(key, self.version);
        let mut state = None;
        for item in self.store.iter_range(Some(start.as_slice()), Some(end.as_slice()))? {
            state = Some(item?.1);
        }
        match state {
            Some(raw) => decode_value(&raw),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for ImmutableTree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImmutableTree")
            .field("prefix", &String::from_utf8_lossy(self.store.prefix()))
            .field("version", &self.version)
            .field("root_hash", &self.root_hash)
            .field("size", &self.size)
            .finish()
    }
}

/// Decoded `d` record: key, version, raw value.
type DataRecord = (Vec<u8>, Version, Vec<u8>);

/// Walks `d` records in key order, yielding each key's state at `target`
/// when it is a live value.
///
/// Once the records run out, the number of yielded entries is checked
/// against the size committed with the version.
struct LiveEntries<'a> {
    records: KvIter<'a>,
    target: Version,
    expected: u64,
    yielded: u64,
    peeked: Option<DataRecord>,
    exhausted: bool,
    done: bool,
}

impl<'a> LiveEntries<'a> {
    fn new(records: KvIter<'a>, target: Version, expected: u64) -> Self {
        Self {
            records,
            target,
            expected,
            yielded: 0,
            peeked: None,
            exhausted: false,
            done: false,
        }
    }

    fn next_record(&mut self) -> TreeResult<Option<DataRecord>> {
        if let Some(record) = self.peeked.take() {
            return Ok(Some(record));
        }
        if self.exhausted {
            return Ok(None);
        }
        let Some(item) = self.records.next() else {
            self.exhausted = true;
            return Ok(None);
        };
        let (raw_key, raw_value) = item?;
        let (key, version) = parse_data_key(&raw_key)
            .ok_or_else(|| TreeError::Corrupt(format!("malformed data key {raw_key:?}")))?;
        Ok(Some((key, version, raw_value)))
    }

    fn step(&mut self) -> TreeResult<Option<(Vec<u8>, Vec<u8>)>> {
        while let Some((key, version, raw)) = self.next_record()? {
            let mut state = (version <= self.target).then_some(raw);
            loop {
                match self.next_record()? {
                    Some((next_key, next_version, next_raw)) if next_key == key => {
                        if next_version <= self.target {
                            state = Some(next_raw);
                        }
                    }
                    other => {
                        self.peeked = other;
                        break;
                    }
                }
            }

            if let Some(value) = state.map(|raw| decode_value(&raw)).transpose()?.flatten() {
                self.yielded += 1;
                return Ok(Some((key, value)));
            }
        }

        if self.yielded != self.expected {
            return Err(TreeError::Corrupt(format!(
                "version {} records {} keys but {} are live",
                self.target, self.expected, self.yielded
            )));
        }
        Ok(None)
    }
}

impl Iterator for LiveEntries<'_> {
    type Item = TreeResult<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
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

/// Writable tree used to build versioned namespaces.
///
/// Mutations accumulate in a working set until [`MutableTree::save_version`]
/// commits them as the next version.
pub struct MutableTree<'a> {
    store: PrefixStore<'a>,
    working: BTreeMap<Vec<u8>, Vec<u8>>,
    pending: Vec<Change>,
    versions: Vec<Version>,
    version: Version,
    root_hash: RootHash,
}

impl<'a> MutableTree<'a> {
    /// Open the tree under `prefix`, positioned at its latest version.
    pub fn open(store: &'a dyn KvStore, prefix: &[u8]) -> TreeResult<Self> {
        let latest = ImmutableTree::load(store, prefix, LATEST_VERSION)?;
        let working = latest.iter().collect::<TreeResult<BTreeMap<_, _>>>()?;
        Ok(Self {
            store: PrefixStore::new(store, prefix)?,
            working,
            pending: Vec::new(),
            versions: latest.available_versions,
            version: latest.version,
            root_hash: latest.root_hash,
        })
    }

    /// Set `key` to `value` in the working set.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> TreeResult<()> {
        if key.is_empty() {
            return Err(TreeError::EmptyKey);
        }
        self.working.insert(key.to_vec(), value.to_vec());
        self.pending.push(Change::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    /// Remove `key` from the working set. Returns `true` if it was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        if self.working.remove(key).is_none() {
            return false;
        }
        self.pending.push(Change::Remove { key: key.to_vec() });
        true
    }

    /// Value of `key` in the working set.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.working.get(key).map(Vec::as_slice)
    }

    /// Commit the working set as the next version.
    pub fn save_version(&mut self) -> TreeResult<(RootHash, Version)> {
        let next = self.version + 1;

        let content = merkle_root(
            self.working
                .iter()
                .map(|(k, v)| leaf_hash(k, v))
                .collect(),
        );
        let root_hash = version_hash(&self.root_hash, next, &changeset_hash(&self.pending), &content);

        // One data record per touched key, holding its state at `next`.
        let mut touched: BTreeMap<&[u8], Option<&[u8]>> = BTreeMap::new();
        for change in &self.pending {
            touched.insert(change.key(), self.working.get(change.key()).map(Vec::as_slice));
        }
        let mut ops = Vec::with_capacity(touched.len() + 1);
        for (key, value) in touched {
            ops.push(BatchOp::Put {
                key: data_key(key, next),
                value: encode_value(value)?,
            });
        }
        let record = VersionRecord {
            root_hash,
            size: self.working.len() as u64,
        };
        ops.push(BatchOp::Put {
            key: version_key(next),
            value: record.encode()?,
        });
        self.store.write_batch(&ops)?;

        debug!(version = next, changes = self.pending.len(), root = %root_hash.short_hex(), "saved tree version");
        self.pending.clear();
        self.versions.push(next);
        self.version = next;
        self.root_hash = root_hash;
        Ok((root_hash, next))
    }

    /// Latest committed version, `0` if none.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Root hash of the latest committed version.
    pub fn root_hash(&self) -> RootHash {
        self.root_hash
    }

    pub fn available_versions(&self) -> &[Version] {
        &self.versions
    }
}

fn read_version_records(store: &dyn KvStore) -> TreeResult<BTreeMap<Version, VersionRecord>> {
    let mut records = BTreeMap::new();
    for item in store.iter_prefix(&[VERSION_TAG])? {
        let (raw_key, raw_value) = item?;
        let version = parse_version_key(&raw_key)
            .ok_or_else(|| TreeError::Corrupt(format!("malformed version key {raw_key:?}")))?;
        if version == 0 {
            return Err(TreeError::Corrupt("version 0 is reserved".into()));
        }
        records.insert(version, VersionRecord::decode(&raw_value)?);
    }
    Ok(records)
}
