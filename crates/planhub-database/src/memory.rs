//! In-memory repositories.
//!
//! Process-local stores used when `database.provider = "memory"` and by
//! tests. Data is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use planhub_core::error::AppError;
use planhub_core::result::AppResult;
use planhub_core::types::id::{NotificationId, UserId};
use planhub_core::types::pagination::PageRequest;
use planhub_entity::notification::{Notification, PreferenceMap};
use planhub_entity::user::User;

use crate::repositories::{NotificationFilter, NotificationRepository, UserRepository};

#[derive(Debug, Default)]
struct NotificationTable {
    /// Rows in insertion order.
    rows: Vec<Notification>,
    /// Notification id → position in `rows`.
    index: HashMap<NotificationId, usize>,
}

/// Notification repository held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationRepository {
    table: Arc<RwLock<NotificationTable>>,
}

impl MemoryNotificationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        let mut table = self.table.write().await;
        if table.index.contains_key(&notification.id) {
            return Err(AppError::database(format!(
                "Duplicate notification id {}",
                notification.id
            )));
        }
        let position = table.rows.len();
        table.index.insert(notification.id, position);
        table.rows.push(notification.clone());
        debug!(notification_id = %notification.id, "Stored notification in memory");
        Ok(())
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        let table = self.table.read().await;
        Ok(table.index.get(&id).map(|&i| table.rows[i].clone()))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        filter: NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Notification>, u64)> {
        let table = self.table.read().await;
        let matching: Vec<&Notification> = table
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && (!filter.unread_only || n.is_unread()))
            .collect();
        let total = matching.len() as u64;
        // Page 1 holds the newest rows; each page still reads oldest-first.
        let mut items: Vec<Notification> = matching
            .into_iter()
            .rev()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        items.reverse();
        Ok((items, total))
    }

    async fn unread_count(&self, user_id: UserId) -> AppResult<u64> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .filter(|n| n.user_id == user_id && n.is_unread())
            .count() as u64)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        let mut table = self.table.write().await;
        let Some(&position) = table.index.get(&id) else {
            return Ok(None);
        };
        let row = &mut table.rows[position];
        row.mark_read(at);
        Ok(Some(row.clone()))
    }

    async fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let mut table = self.table.write().await;
        let flipped = table
            .rows
            .iter_mut()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.mark_read(at))
            .filter(|changed| *changed)
            .count();
        Ok(flipped as u64)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.table.read().await.rows.len() as u64)
    }
}

/// User repository held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::validation(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &PreferenceMap,
    ) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.notification_preferences = preferences.clone();
            user.clone()
        }))
    }

    async fn merge_preferences(
        &self,
        id: UserId,
        changes: &PreferenceMap,
    ) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.notification_preferences.merge(changes);
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planhub_entity::notification::NotificationCategory;
    use planhub_entity::user::UserRole;

    fn note(user_id: UserId, title: &str) -> Notification {
        Notification::new(user_id, NotificationCategory::Message, title, "body", None)
    }

    #[tokio::test]
    async fn test_pages_start_from_newest_and_read_oldest_first() {
        let repo = MemoryNotificationRepository::new();
        let user = UserId::new();
        for i in 0..5 {
            repo.insert(&note(user, &format!("n{i}"))).await.unwrap();
        }
        repo.insert(&note(UserId::new(), "other")).await.unwrap();

        let titles = |items: Vec<Notification>| -> Vec<String> {
            items.into_iter().map(|n| n.title).collect()
        };
        let filter = NotificationFilter::default();

        let (items, total) = repo
            .list_for_user(user, filter, &PageRequest::try_new(1, 2, 100).unwrap())
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(titles(items), vec!["n3", "n4"]);

        let (items, _) = repo
            .list_for_user(user, filter, &PageRequest::try_new(3, 2, 100).unwrap())
            .await
            .unwrap();
        assert_eq!(titles(items), vec!["n0"]);

        let (items, total) = repo
            .list_for_user(user, filter, &PageRequest::try_new(1 << 62, 4, 100).unwrap())
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_mark_read_keeps_first_timestamp() {
        let repo = MemoryNotificationRepository::new();
        let user = UserId::new();
        let n = note(user, "hello");
        repo.insert(&n).await.unwrap();

        let first = Utc::now();
        let stored = repo.mark_read(n.id, first).await.unwrap().unwrap();
        assert_eq!(stored.read_at, Some(first));

        let later = first + chrono::Duration::seconds(5);
        let stored = repo.mark_read(n.id, later).await.unwrap().unwrap();
        assert_eq!(stored.read_at, Some(first));
        assert_eq!(repo.unread_count(user).await.unwrap(), 0);
        assert!(repo.mark_read(NotificationId::new(), later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_all_read_counts_only_flips() {
        let repo = MemoryNotificationRepository::new();
        let user = UserId::new();
        let a = note(user, "a");
        repo.insert(&a).await.unwrap();
        repo.insert(&note(user, "b")).await.unwrap();
        repo.insert(&note(user, "c")).await.unwrap();
        repo.mark_read(a.id, Utc::now()).await.unwrap();

        assert_eq!(repo.mark_all_read(user, Utc::now()).await.unwrap(), 2);
        assert_eq!(repo.mark_all_read(user, Utc::now()).await.unwrap(), 0);

        let unread = NotificationFilter { unread_only: true };
        let (items, total) = repo
            .list_for_user(user, unread, &PageRequest::default())
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_user_preferences_update() {
        let repo = MemoryUserRepository::new();
        let user = User::new("alex", UserRole::Member);
        repo.insert(&user).await.unwrap();
        assert!(repo.insert(&User::new("alex", UserRole::Admin)).await.is_err());

        let prefs = PreferenceMap::new().with(NotificationCategory::Like, false);
        let updated = repo.update_preferences(user.id, &prefs).await.unwrap().unwrap();
        assert!(!updated.notification_preferences.is_enabled(NotificationCategory::Like));
        assert!(repo.update_preferences(UserId::new(), &prefs).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_preference_merges_keep_both_keys() {
        let repo = MemoryUserRepository::new();
        let user = User::new("jo", UserRole::Member);
        repo.insert(&user).await.unwrap();

        let likes = PreferenceMap::new().with(NotificationCategory::Like, false);
        let joins = PreferenceMap::new().with(NotificationCategory::Join, false);
        let (a, b) = tokio::join!(
            repo.merge_preferences(user.id, &likes),
            repo.merge_preferences(user.id, &joins),
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.notification_preferences.is_enabled(NotificationCategory::Like));
        assert!(!stored.notification_preferences.is_enabled(NotificationCategory::Join));
        assert!(repo.merge_preferences(UserId::new(), &likes).await.unwrap().is_none());
    }
}
