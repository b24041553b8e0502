//! HTTP server for statediff.
//!
//! Exposes a read-only JSON API over one open [`StorePair`](statediff_compare::StorePair):
//! store statistics, the list of common modules, and per-module diffs and
//! version listings. Store work runs on tokio's blocking pool; the pair is
//! closed when the server shuts down.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, DEFAULT_BIND_ADDR};
pub use error::{ServerError, ServerResult};
pub use server::StateDiffServer;
pub use state::AppState;
