use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use statediff_compare::{CloseError, CompareError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error("closing stores: {0}")]
    Close(#[from] CloseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error: store failures are server-side, version
    /// and input problems are the caller's.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Compare(e) if e.is_store_io() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Compare(_) | Self::Config(_) => StatusCode::BAD_REQUEST,
            Self::Close(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
