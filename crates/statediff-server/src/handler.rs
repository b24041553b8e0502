use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;
use serde_json::json;
use statediff_compare::{CompareResult, ModuleReportView, ModuleSummary, ModuleVersions, StatsView};

use crate::error::ServerResult;
use crate::state::AppState;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "statediff-server",
        "version": env!("CARGO_PKG_VERSION"),
        "left": state.left_label,
        "right": state.right_label,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub left: StatsView,
    pub right: StatsView,
}

/// Key statistics of both stores.
pub async fn stats_handler(State(state): State<AppState>) -> ServerResult<Json<StatsResponse>> {
    let (left, right) = state.run(|pair| pair.stats()).await?;
    Ok(Json(StatsResponse {
        left: StatsView::from(&left),
        right: StatsView::from(&right),
    }))
}

#[derive(Debug, Serialize)]
pub struct ModulesResponse {
    pub modules: Vec<ModuleSummary>,
}

/// Modules present in both stores, with their latest versions and key
/// counts.
pub async fn modules_handler(State(state): State<AppState>) -> ServerResult<Json<ModulesResponse>> {
    let modules = state
        .run(|pair| -> CompareResult<Vec<ModuleSummary>> {
            pair.modules()?
                .iter()
                .map(|module| pair.module_summary(module))
                .collect()
        })
        .await?;
    Ok(Json(ModulesResponse { modules }))
}

/// Diff one module at the highest common version.
pub async fn module_diff_handler(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> ServerResult<Json<ModuleReportView>> {
    let report = state.run(move |pair| pair.compare_module(&module)).await?;
    Ok(Json(ModuleReportView::from(&report)))
}

/// Version lists of one module.
pub async fn module_versions_handler(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> ServerResult<Json<ModuleVersions>> {
    let versions = state.run(move |pair| pair.module_versions(&module)).await?;
    Ok(Json(versions))
}
