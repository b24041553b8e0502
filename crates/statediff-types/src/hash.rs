use std::fmt;

use serde::{Deserialize, Serialize};

/// Root digest of a loaded tree version.
///
/// A `RootHash` summarizes both the committed key/value content of a version
/// and the history of operations that produced it. Two trees holding the same
/// keys can therefore disagree on their root hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootHash([u8; 32]);

impl RootHash {
    /// Hash of the tree before any version was committed.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` for the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Create a `RootHash` from a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Plain BLAKE3 digest of raw bytes.
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl Default for RootHash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for RootHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootHash({})", self.short_hex())
    }
}

impl fmt::Display for RootHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
