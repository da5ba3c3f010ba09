//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planhub_core::types::id::{NotificationId, UserId};

use super::category::NotificationCategory;

/// A notification delivered to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier, assigned at creation.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// Notification category.
    pub category: NotificationCategory,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Optional deep link into the application.
    pub link: Option<String>,
    /// Whether the user has read this notification. Never reverts to false.
    pub is_read: bool,
    /// When the notification was first marked read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build a fresh, unread notification with a new id and the current time.
    pub fn new(
        user_id: UserId,
        category: NotificationCategory,
        title: impl Into<String>,
        body: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            category,
            title: title.into(),
            body: body.into(),
            link,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Flip to read. Returns `true` only when the state actually changed.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        true
    }
}

/// One page of a user's notification feed plus feed-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    /// Items on this page, oldest first.
    pub items: Vec<Notification>,
    /// Number of items matching the filter across all pages.
    pub total_count: u64,
    /// Number of unread items the user owns across all pages.
    pub unread_count: u64,
    /// Page number (1-based).
    pub page: u64,
    /// Requested page size after clamping.
    pub page_size: u64,
}
