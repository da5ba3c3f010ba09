//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planhub_core::types::id::UserId;

use super::role::UserRole;
use crate::notification::PreferenceMap;

/// A registered PlanHub user, as seen by the notification core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// User role.
    pub role: UserRole,
    /// Per-category notification opt-outs.
    #[serde(default)]
    pub notification_preferences: PreferenceMap,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a member with default preferences.
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            role,
            notification_preferences: PreferenceMap::default(),
            created_at: Utc::now(),
        }
    }

    /// Check if the user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
