use std::sync::Arc;

use statediff_compare::{CompareResult, StorePair};

use crate::error::{ServerError, ServerResult};

/// Shared request state: the open store pair plus display labels for each
/// side.
#[derive(Clone, Debug)]
pub struct AppState {
    pub pair: Arc<StorePair>,
    pub left_label: String,
    pub right_label: String,
}

impl AppState {
    pub fn new(pair: Arc<StorePair>, left_label: impl Into<String>, right_label: impl Into<String>) -> Self {
        Self {
            pair,
            left_label: left_label.into(),
            right_label: right_label.into(),
        }
    }

    /// Run a synchronous store operation on the blocking pool.
    pub async fn run<T, F>(&self, op: F) -> ServerResult<T>
    where
        F: FnOnce(&StorePair) -> CompareResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pair = Arc::clone(&self.pair);
        let result = tokio::task::spawn_blocking(move || op(&pair))
            .await
            .map_err(|e| ServerError::Internal(format!("store task failed: {e}")))?;
        Ok(result?)
    }
}
