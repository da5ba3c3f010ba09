//! Request DTOs with validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use planhub_core::types::id::UserId;
use planhub_service::notification::NewNotification;

/// Notification creation body.
///
/// Fields are optional so that absence surfaces as a missing-field
/// rejection from the service rather than a JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    /// Recipient.
    pub target_user_id: Option<UserId>,
    /// Category wire name.
    pub category: Option<String>,
    /// Title.
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub title: Option<String>,
    /// Body.
    #[validate(length(max = 4000, message = "must be at most 4000 characters"))]
    pub body: Option<String>,
    /// Deep link into the app.
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub link: Option<String>,
}

impl From<CreateNotificationRequest> for NewNotification {
    fn from(req: CreateNotificationRequest) -> Self {
        Self {
            target_user_id: req.target_user_id,
            category: req.category,
            title: req.title,
            body: req.body,
            link: req.link,
        }
    }
}

/// Preference update body: category wire name → enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePreferencesRequest {
    /// Entries to change; categories not listed keep their current value.
    pub preferences: BTreeMap<String, bool>,
}

/// System broadcast body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BroadcastRequest {
    /// Title.
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    /// Message body.
    #[validate(length(min = 1, max = 4000, message = "must be 1-4000 characters"))]
    pub message: String,
    /// `info`, `warning` or `critical`.
    #[serde(default = "default_severity")]
    #[validate(custom(function = "validate_severity"))]
    pub severity: String,
}

fn default_severity() -> String {
    "info".to_string()
}

fn validate_severity(severity: &str) -> Result<(), ValidationError> {
    match severity {
        "info" | "warning" | "critical" => Ok(()),
        _ => {
            let mut err = ValidationError::new("severity");
            err.message = Some("must be one of info, warning, critical".into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::validate_request;

    #[test]
    fn test_broadcast_severity_is_checked() {
        let req = BroadcastRequest {
            title: "Maintenance".into(),
            message: "Tonight at 22:00".into(),
            severity: "loud".into(),
        };
        let err = validate_request(&req).unwrap_err();
        assert!(err.message.starts_with("severity:"));

        let req = BroadcastRequest {
            severity: "warning".into(),
            ..req
        };
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_overlong_title_rejected() {
        let req = CreateNotificationRequest {
            title: Some("x".repeat(201)),
            ..Default::default()
        };
        assert!(validate_request(&req).is_err());
        assert!(validate_request(&CreateNotificationRequest::default()).is_ok());
    }
}
