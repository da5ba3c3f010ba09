//! The identity an operation is performed as.

use serde::{Deserialize, Serialize};

use planhub_core::types::id::UserId;
use planhub_entity::user::UserRole;

use crate::jwt::{Claims, TokenRole};

/// Who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// A trusted backend producer.
    System,
    /// An authenticated end user.
    User {
        /// The user's id.
        id: UserId,
        /// The user's role.
        role: UserRole,
    },
}

impl Principal {
    /// Build a principal for a user.
    pub fn user(id: UserId, role: UserRole) -> Self {
        Self::User { id, role }
    }

    /// The user id, if this is a user principal.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::System => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    /// Whether this principal may act on behalf of the platform
    /// (system producers and admins).
    pub fn is_privileged(&self) -> bool {
        match self {
            Self::System => true,
            Self::User { role, .. } => role.is_admin(),
        }
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        match claims.role {
            TokenRole::System => Self::System,
            TokenRole::Admin => Self::user(claims.sub, UserRole::Admin),
            TokenRole::Member => Self::user(claims.sub, UserRole::Member),
        }
    }
}
