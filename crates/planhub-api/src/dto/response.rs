//! Response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use planhub_entity::notification::{Notification, NotificationCategory, NotificationPage};
use planhub_realtime::metrics::MetricsSnapshot;
use planhub_service::notification::SkipReason;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Result of a creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationResponse {
    /// Whether nothing was stored.
    pub skipped: bool,
    /// Why nothing was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    /// The stored record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    /// Live connections that received the push.
    pub delivered: usize,
}

/// One page of the caller's feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationListResponse {
    /// Items, oldest first.
    pub items: Vec<Notification>,
    /// Items matching the filter.
    pub total_count: u64,
    /// Unread items overall.
    pub unread_count: u64,
    /// Page number.
    pub page: u64,
    /// Page size actually used.
    pub limit: u64,
}

impl From<NotificationPage> for NotificationListResponse {
    fn from(page: NotificationPage) -> Self {
        Self {
            items: page.items,
            total_count: page.total_count,
            unread_count: page.unread_count,
            page: page.page,
            limit: page.page_size,
        }
    }
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count.
    pub count: u64,
}

/// Result of mark-all-read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    /// Notifications that changed state.
    pub updated: u64,
}

/// Effective preference per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    /// Every category with its enabled flag.
    pub preferences: BTreeMap<NotificationCategory, bool>,
}

/// Result of a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastResponse {
    /// Broadcast id.
    pub id: Uuid,
    /// Connections reached.
    pub delivered: usize,
    /// Connections that could not take the message.
    pub failed: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Detailed health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database status.
    pub database: String,
    /// Users with at least one authenticated connection.
    pub online_users: usize,
    /// Authenticated connections.
    pub authenticated_connections: usize,
    /// Open sockets, authenticated or not.
    pub open_connections: usize,
    /// Realtime counters.
    pub metrics: MetricsSnapshot,
}
