//! Request context carrying the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planhub_auth::Principal;
use planhub_core::error::AppError;
use planhub_core::types::id::UserId;

/// Context for the current authenticated request.
///
/// Built by the API layer from the bearer token and passed into service
/// methods so that every operation knows who is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Who is acting.
    pub principal: Principal,
    /// Username or service name from the token.
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(principal: Principal, username: impl Into<String>) -> Self {
        Self {
            principal,
            username: username.into(),
            request_time: Utc::now(),
        }
    }

    /// The acting user. System principals have no user and are rejected.
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.principal
            .user_id()
            .ok_or_else(|| AppError::authentication("This operation requires a user token"))
    }

    /// Returns whether the caller is the system or an admin.
    pub fn is_privileged(&self) -> bool {
        self.principal.is_privileged()
    }
}
