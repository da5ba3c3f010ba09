//! Preference query and update for the calling user.

use std::sync::Arc;

use tracing::info;

use planhub_core::error::AppError;
use planhub_core::types::id::UserId;
use planhub_database::repositories::UserRepository;
use planhub_entity::notification::PreferenceMap;

/// Reads, replaces and merges a user's notification preference map.
#[derive(Debug, Clone)]
pub struct PreferenceService {
    users: Arc<dyn UserRepository>,
}

impl PreferenceService {
    /// Creates a new preference service.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// The user's stored preference map.
    pub async fn get_preferences(&self, user_id: UserId) -> Result<PreferenceMap, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.notification_preferences)
            .ok_or_else(|| unknown(user_id))
    }

    /// Replace the user's preference map wholesale.
    pub async fn update_preferences(
        &self,
        user_id: UserId,
        preferences: PreferenceMap,
    ) -> Result<PreferenceMap, AppError> {
        let user = self
            .users
            .update_preferences(user_id, &preferences)
            .await?
            .ok_or_else(|| unknown(user_id))?;
        info!(user_id = %user_id, "Notification preferences updated");
        Ok(user.notification_preferences)
    }

    /// Apply a partial update; categories not in `changes` are left alone.
    pub async fn merge_preferences(
        &self,
        user_id: UserId,
        changes: PreferenceMap,
    ) -> Result<PreferenceMap, AppError> {
        let user = self
            .users
            .merge_preferences(user_id, &changes)
            .await?
            .ok_or_else(|| unknown(user_id))?;
        info!(user_id = %user_id, changed = changes.iter().count(), "Notification preferences merged");
        Ok(user.notification_preferences)
    }
}

fn unknown(user_id: UserId) -> AppError {
    AppError::unknown_user(format!("User {user_id} does not exist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planhub_core::error::ErrorKind;
    use planhub_database::MemoryUserRepository;
    use planhub_entity::notification::NotificationCategory;
    use planhub_entity::user::{User, UserRole};

    #[tokio::test]
    async fn test_update_replaces_map() {
        let users = Arc::new(MemoryUserRepository::new());
        let user = User::new("dana", UserRole::Member);
        users.insert(&user).await.unwrap();
        let service = PreferenceService::new(users);

        let first = PreferenceMap::new().with(NotificationCategory::Like, false);
        service.update_preferences(user.id, first).await.unwrap();

        let second = PreferenceMap::new().with(NotificationCategory::Join, false);
        let stored = service.update_preferences(user.id, second.clone()).await.unwrap();
        assert_eq!(stored, second);
        assert!(service
            .get_preferences(user.id)
            .await
            .unwrap()
            .is_enabled(NotificationCategory::Like));
    }

    #[tokio::test]
    async fn test_merge_keeps_untouched_categories() {
        let users = Arc::new(MemoryUserRepository::new());
        let user = User::new("eli", UserRole::Member);
        users.insert(&user).await.unwrap();
        let service = PreferenceService::new(users);

        let off = PreferenceMap::new().with(NotificationCategory::Like, false);
        service.merge_preferences(user.id, off).await.unwrap();
        let mixed = PreferenceMap::new()
            .with(NotificationCategory::Join, false)
            .with(NotificationCategory::Like, true);
        let stored = service.merge_preferences(user.id, mixed).await.unwrap();

        assert!(stored.is_enabled(NotificationCategory::Like));
        assert!(!stored.is_enabled(NotificationCategory::Join));

        let err = service
            .merge_preferences(UserId::new(), PreferenceMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownUser);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let service = PreferenceService::new(Arc::new(MemoryUserRepository::new()));
        let err = service.get_preferences(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownUser);
    }
}
