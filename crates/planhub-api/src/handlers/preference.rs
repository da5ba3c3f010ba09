//! Notification preference handlers.

use axum::Json;
use axum::extract::State;

use planhub_entity::notification::{NotificationCategory, PreferenceMap};

use crate::dto::request::UpdatePreferencesRequest;
use crate::dto::response::{ApiResponse, PreferencesResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

fn effective(prefs: &PreferenceMap) -> PreferencesResponse {
    PreferencesResponse {
        preferences: NotificationCategory::ALL
            .iter()
            .map(|c| (*c, prefs.is_enabled(*c)))
            .collect(),
    }
}

/// GET /api/notifications/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<PreferencesResponse>>> {
    let prefs = state
        .preference_service
        .get_preferences(auth.user_id()?)
        .await?;
    Ok(Json(ApiResponse::ok(effective(&prefs))))
}

/// PUT /api/notifications/preferences
///
/// Unknown category names reject the whole update.
pub async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdatePreferencesRequest>,
) -> ApiResult<Json<ApiResponse<PreferencesResponse>>> {
    let user_id = auth.user_id()?;

    let mut changes = PreferenceMap::new();
    for (name, enabled) in req.preferences {
        changes.set(name.parse::<NotificationCategory>()?, enabled);
    }

    let saved = state
        .preference_service
        .merge_preferences(user_id, changes)
        .await?;
    Ok(Json(ApiResponse::ok(effective(&saved))))
}
