use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all statediff endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/stats", get(handler::stats_handler))
        .route("/v1/modules", get(handler::modules_handler))
        .route("/v1/modules/:module/diff", get(handler::module_diff_handler))
        .route("/v1/modules/:module/versions", get(handler::module_versions_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
