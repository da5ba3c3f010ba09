//! Repository traits and their PostgreSQL implementations.

pub mod notification;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use planhub_core::result::AppResult;
use planhub_core::types::id::{NotificationId, UserId};
use planhub_core::types::pagination::PageRequest;
use planhub_entity::notification::{Notification, PreferenceMap};
use planhub_entity::user::User;

pub use notification::PgNotificationRepository;
pub use user::PgUserRepository;

/// Filter applied when listing a user's notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    /// Only return notifications that have not been read.
    pub unread_only: bool,
}

/// Durable storage for notifications.
///
/// Listing is always oldest first, ties broken by insertion order.
#[async_trait]
pub trait NotificationRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a freshly built notification.
    async fn insert(&self, notification: &Notification) -> AppResult<()>;

    /// Find a notification by id regardless of owner.
    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>>;

    /// One page of a user's notifications plus the filtered total.
    async fn list_for_user(
        &self,
        user_id: UserId,
        filter: NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Notification>, u64)>;

    /// Count a user's unread notifications.
    async fn unread_count(&self, user_id: UserId) -> AppResult<u64>;

    /// Mark one notification read. An already-read notification keeps its
    /// original `read_at`. Returns the stored row, or `None` if absent.
    async fn mark_read(
        &self,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>>;

    /// Mark every unread notification of a user read; returns how many flipped.
    async fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64>;

    /// Total number of stored notifications.
    async fn count(&self) -> AppResult<u64>;
}

/// User lookup and preference storage.
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Insert a user record.
    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Replace a user's preference map; returns the updated user if present.
    async fn update_preferences(
        &self,
        id: UserId,
        preferences: &PreferenceMap,
    ) -> AppResult<Option<User>>;

    /// Overlay `changes` onto the stored map in one step; returns the
    /// updated user if present.
    async fn merge_preferences(
        &self,
        id: UserId,
        changes: &PreferenceMap,
    ) -> AppResult<Option<User>>;
}
