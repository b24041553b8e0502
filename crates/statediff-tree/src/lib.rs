//! Versioned Merkle tree for statediff.
//!
//! A tree lives inside one namespace of an ordered [`KvStore`](statediff_store::KvStore)
//! and records a monotonic sequence of committed versions. Loading a version
//! yields an [`ImmutableTree`]: a read view over the live keys at that
//! version plus its [`RootHash`](statediff_types::RootHash). The view reads
//! through to the store lazily; nothing beyond the version records is
//! loaded up front.
//!
//! Root hashes chain the previous version's hash and the ordered changeset,
//! so two trees with identical final content can still hash differently
//! when they were built through different operation histories.
//!
//! # Key Types
//!
//! - [`TreeView`] -- read surface consumed by the diff engine
//! - [`ImmutableTree`] -- one loaded version
//! - [`MutableTree`] -- writer that commits new versions

pub mod error;
pub mod hash;
pub mod layout;
pub mod tree;

pub use error::{TreeError, TreeResult};
pub use hash::Change;
pub use layout::VersionRecord;
pub use tree::{ImmutableTree, MutableTree, TreeIter, TreeView};
