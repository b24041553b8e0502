//! Root hashing for committed versions.
//!
//! A version's root hash commits to three things: the previous version's
//! root hash, the ordered changeset applied in this version, and a binary
//! Merkle root over the live `(key, value)` leaves. Chaining the previous
//! root and the changeset makes the hash depend on how the content was
//! produced, not only on the content itself.

use statediff_types::{RootHash, Version};

const DOMAIN: &[u8] = b"statediff-tree-v1";

/// One mutation recorded in a version's changeset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Set { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}

impl Change {
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Set { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// Hash a single live entry.
pub fn leaf_hash(key: &[u8], value: &[u8]) -> RootHash {
    let mut hasher = domain_hasher(b"leaf");
    update_prefixed(&mut hasher, key);
    update_prefixed(&mut hasher, value);
    RootHash::from_hash(*hasher.finalize().as_bytes())
}

/// Binary Merkle root over leaf hashes, in the order given.
///
/// An empty list produces the zero hash. A single leaf is its own root. An
/// odd node at any level is hashed with itself.
pub fn merkle_root(leaves: Vec<RootHash>) -> RootHash {
    if leaves.is_empty() {
        return RootHash::zero();
    }

    let mut current = leaves;
    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        for pair in current.chunks(2) {
            let hash = if pair.len() == 2 {
                hash_pair(&pair[0], &pair[1])
            } else {
                hash_pair(&pair[0], &pair[0])
            };
            next.push(hash);
        }
        current = next;
    }
    current[0]
}

/// Digest of an ordered changeset.
pub fn changeset_hash(changes: &[Change]) -> RootHash {
    let mut hasher = domain_hasher(b"changeset");
    for change in changes {
        match change {
            Change::Set { key, value } => {
                hasher.update(&[0x01]);
                update_prefixed(&mut hasher, key);
                update_prefixed(&mut hasher, value);
            }
            Change::Remove { key } => {
                hasher.update(&[0x02]);
                update_prefixed(&mut hasher, key);
            }
        }
    }
    RootHash::from_hash(*hasher.finalize().as_bytes())
}

/// Root hash of `version`.
pub fn version_hash(
    previous: &RootHash,
    version: Version,
    changeset: &RootHash,
    content: &RootHash,
) -> RootHash {
    let mut hasher = domain_hasher(b"version");
    hasher.update(previous.as_bytes());
    hasher.update(&version.to_be_bytes());
    hasher.update(changeset.as_bytes());
    hasher.update(content.as_bytes());
    RootHash::from_hash(*hasher.finalize().as_bytes())
}

fn hash_pair(left: &RootHash, right: &RootHash) -> RootHash {
    let mut hasher = domain_hasher(b"node");
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    RootHash::from_hash(*hasher.finalize().as_bytes())
}

fn domain_hasher(kind: &[u8]) -> blake3::Hasher {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DOMAIN);
    hasher.update(b":");
    hasher.update(kind);
    hasher.update(b":");
    hasher
}

fn update_prefixed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
