//! Ordered key-value stores for statediff.
//!
//! Both sides of a comparison are plain ordered byte-keyed stores. Higher
//! layers (the versioned Merkle tree, module discovery, statistics) only
//! ever talk to the [`KvStore`] trait.
//!
//! # Backends
//!
//! - [`MemoryStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`RocksStore`] -- on-disk `.db` directory backed by RocksDB, read-only for comparisons
//! - [`PrefixStore`] -- namespace view over any other store
//!
//! # Design Rules
//!
//! 1. Iteration is ascending by raw key bytes, half-open `[start, end)`.
//! 2. Iterators are lazy and restartable; each call starts fresh.
//! 3. Concurrent reads are always safe.
//! 4. Keys are never empty.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
mod map;
pub mod memory;
pub mod prefix;
pub mod rocks;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use prefix::PrefixStore;
pub use rocks::RocksStore;
pub use traits::{prefix_end, BatchOp, KvIter, KvPair, KvStore};
