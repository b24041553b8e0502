//! Foundation types for statediff.
//!
//! Every other statediff crate depends on `statediff-types`.
//!
//! # Key Types
//!
//! - [`RootHash`] -- 32-byte digest of a tree version (content and history)
//! - [`ModulePrefix`] -- `s/k:{module}/` namespace of one logical module
//! - [`Version`] -- committed tree version number; `0` means "latest"

pub mod error;
pub mod hash;
pub mod prefix;

pub use error::TypeError;
pub use hash::RootHash;
pub use prefix::{ModulePrefix, MODULE_KEY_PREFIX};

/// Committed tree version. Real versions start at 1.
pub type Version = u64;

/// Sentinel passed to tree loaders to request the most recent version.
pub const LATEST_VERSION: Version = 0;
