//! Health check handler

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::super::state::AppState;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Whether the duplex link to the clearinghouse is currently up
    pub channel_connected: bool,
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

/// Service health and clearing-channel status
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        channel_connected: state.channel.is_connected(),
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
    })
}
