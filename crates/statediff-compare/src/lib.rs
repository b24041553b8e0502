//! Comparison engine for statediff.
//!
//! Compares two stores ("left" and "right") that each hold many versioned
//! Merkle trees, one per module namespace `s/k:<module>/`. For a module, the
//! engine loads both trees, settles on the highest version committed on both
//! sides, and reports either that the trees are identical, that only their
//! root hashes differ, or which keys diverge.
//!
//! # Key Types
//!
//! - [`StorePair`] -- the two open stores; entry point for every operation
//! - [`TreePair`] -- one module's trees loaded from both sides
//! - [`DiffOutcome`] / [`KeyDiff`] -- result of a tree comparison
//! - [`Stats`] -- key count and first-byte histogram of a store
//! - [`StoreLocation`] / [`CompareConfig`] -- where the stores live
//!
//! # Design Rules
//!
//! - Identical root hashes short-circuit: no entries are read.
//! - Diffs are only taken between trees loaded at the same version.
//! - Any store read failure aborts the operation; partial results are never
//!   returned.
//! - The pair is read-only; comparisons never write to either store.

pub mod config;
pub mod diff;
pub mod display;
pub mod error;
pub mod location;
pub mod modules;
pub mod pair;
pub mod reconcile;
pub mod report;
pub mod stats;

pub use config::{CompareConfig, LEFT_ENV, RIGHT_ENV};
pub use diff::{diff, DiffOutcome, KeyDiff};
pub use display::{pretty_key, KeyDisplay};
pub use error::{CloseError, CompareError, CompareResult, Side};
pub use location::{StoreLocation, STORE_SUFFIX};
pub use modules::{common_modules, discover_modules, module_name};
pub use pair::{ModuleReport, ModuleSummary, ModuleVersions, StorePair, TreePair};
pub use reconcile::reconcile;
pub use report::{DiffStatus, ModuleReportView, StatsView};
pub use stats::Stats;
