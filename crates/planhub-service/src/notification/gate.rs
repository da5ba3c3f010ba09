//! Per-user, per-category delivery check consulted before persisting.

use std::sync::Arc;

use planhub_core::error::AppError;
use planhub_core::types::id::UserId;
use planhub_database::repositories::UserRepository;
use planhub_entity::notification::NotificationCategory;

/// Answers whether a user wants notifications of a given category.
#[derive(Debug, Clone)]
pub struct PreferenceGate {
    users: Arc<dyn UserRepository>,
}

impl PreferenceGate {
    /// Creates a new gate over the user repository.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// `Ok(true)` unless the user has explicitly disabled `category`.
    ///
    /// Returns an `UnknownUser` error when the user does not resolve.
    pub async fn should_deliver(
        &self,
        user_id: UserId,
        category: NotificationCategory,
    ) -> Result<bool, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unknown_user(format!("User {user_id} does not exist")))?;
        Ok(user.notification_preferences.is_enabled(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planhub_core::error::ErrorKind;
    use planhub_database::MemoryUserRepository;
    use planhub_entity::notification::PreferenceMap;
    use planhub_entity::user::{User, UserRole};

    #[tokio::test]
    async fn test_fail_open_for_absent_categories() {
        let users = Arc::new(MemoryUserRepository::new());
        let mut user = User::new("casey", UserRole::Member);
        user.notification_preferences = PreferenceMap::new().with(NotificationCategory::Like, false);
        users.insert(&user).await.unwrap();

        let gate = PreferenceGate::new(users);
        for category in NotificationCategory::ALL {
            let allowed = gate.should_deliver(user.id, category).await.unwrap();
            assert_eq!(allowed, category != NotificationCategory::Like);
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_an_error() {
        let gate = PreferenceGate::new(Arc::new(MemoryUserRepository::new()));
        let err = gate
            .should_deliver(UserId::new(), NotificationCategory::Join)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownUser);
    }
}
