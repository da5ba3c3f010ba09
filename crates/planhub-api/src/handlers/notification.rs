//! Notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use planhub_core::types::id::NotificationId;
use planhub_entity::notification::Notification;
use planhub_realtime::CreationReceipt;
use planhub_service::notification::CreateOutcome;

use crate::dto::request::CreateNotificationRequest;
use crate::dto::response::{
    ApiResponse, CountResponse, CreateNotificationResponse, MarkAllReadResponse,
    NotificationListResponse,
};
use crate::dto::validate_request;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ListParams, MaybeAuthUser};
use crate::state::AppState;

/// POST /api/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    MaybeAuthUser(ctx): MaybeAuthUser,
    Json(req): Json<CreateNotificationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreateNotificationResponse>>)> {
    validate_request(&req)?;

    let CreationReceipt { outcome, delivery } =
        state.pipeline.create(ctx.as_ref(), req.into()).await?;
    let delivered = delivery.map(|d| d.delivered).unwrap_or(0);

    let (status, body) = match outcome {
        CreateOutcome::Created(notification) => (
            StatusCode::CREATED,
            CreateNotificationResponse {
                skipped: false,
                skip_reason: None,
                notification: Some(notification),
                delivered,
            },
        ),
        CreateOutcome::Skipped { reason } => (
            StatusCode::OK,
            CreateNotificationResponse {
                skipped: true,
                skip_reason: Some(reason),
                notification: None,
                delivered,
            },
        ),
    };
    Ok((status, Json(ApiResponse::ok(body))))
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<NotificationListResponse>>> {
    let page = state
        .notification_service
        .list_for_user(auth.user_id()?, params.page, params.limit, params.unread_only)
        .await?;
    Ok(Json(ApiResponse::ok(page.into())))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let count = state
        .notification_service
        .unread_count(auth.user_id()?)
        .await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let notification = state
        .notification_service
        .mark_read(id, auth.user_id()?)
        .await?;
    Ok(Json(ApiResponse::ok(notification)))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = state
        .notification_service
        .mark_all_read(auth.user_id()?)
        .await?;
    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}
