//! System broadcast handler.

use axum::Json;
use axum::extract::State;
use tracing::info;

use planhub_core::error::AppError;
use planhub_realtime::message::types::BroadcastMessage;

use crate::dto::request::BroadcastRequest;
use crate::dto::response::{ApiResponse, BroadcastResponse};
use crate::dto::validate_request;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/broadcast
///
/// Sends to every authenticated connection. Nothing is persisted.
pub async fn send_broadcast(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<BroadcastRequest>,
) -> ApiResult<Json<ApiResponse<BroadcastResponse>>> {
    if !auth.is_privileged() {
        return Err(AppError::authorization("Broadcasts require the system or an admin").into());
    }
    validate_request(&req)?;

    let message = BroadcastMessage::new(req.title, req.message, req.severity);
    let report = state.realtime.dispatcher.broadcast_all(&message);

    info!(
        broadcast_id = %message.id,
        sent_by = %auth.username,
        delivered = report.delivered,
        failed = report.failed,
        "Broadcast sent"
    );

    Ok(Json(ApiResponse::ok(BroadcastResponse {
        id: message.id,
        delivered: report.delivered,
        failed: report.failed,
    })))
}
