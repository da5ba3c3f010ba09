//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let database = match state.repositories.health_check().await {
        Ok(true) => "connected",
        Ok(false) | Err(_) => "unavailable",
    };
    let status = if database == "connected" { "ok" } else { "degraded" };

    let realtime = &state.realtime;
    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        online_users: realtime.registry.room_count(),
        authenticated_connections: realtime.registry.connection_count(),
        open_connections: realtime.connections.open_count(),
        metrics: realtime.metrics.snapshot(),
    }))
}
