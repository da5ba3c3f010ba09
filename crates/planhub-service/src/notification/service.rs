//! Notification creation, listing, and read-state management.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use planhub_core::config::NotificationsConfig;
use planhub_core::error::AppError;
use planhub_core::types::id::{NotificationId, UserId};
use planhub_core::types::pagination::PageRequest;
use planhub_database::repositories::{NotificationFilter, NotificationRepository};
use planhub_entity::notification::{Notification, NotificationCategory, NotificationPage};

use super::gate::PreferenceGate;
use crate::context::RequestContext;

/// Raw creation request from a collaborator.
///
/// Every field is optional here so that absence is reported as a
/// `MissingField` rejection rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient.
    pub target_user_id: Option<UserId>,
    /// Category wire name.
    pub category: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Display body.
    pub body: Option<String>,
    /// Optional deep link.
    pub link: Option<String>,
}

/// Why a creation request produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The recipient has disabled this category.
    PreferenceDisabled,
}

/// Result of a creation request that was not rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The notification was persisted.
    Created(Notification),
    /// Nothing was stored.
    Skipped {
        /// Why nothing was stored.
        reason: SkipReason,
    },
}

impl CreateOutcome {
    /// The stored notification, if any.
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Created(n) => Some(n),
            Self::Skipped { .. } => None,
        }
    }

    /// Whether the request was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Owns the notification log: creation, paged retrieval, and read state.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification repository.
    notifications: Arc<dyn NotificationRepository>,
    /// Preference gate consulted before persisting.
    gate: PreferenceGate,
    /// Categories only privileged principals may create.
    privileged: HashSet<NotificationCategory>,
    /// Upper bound on page size.
    max_page_size: u64,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        gate: PreferenceGate,
        config: &NotificationsConfig,
    ) -> Self {
        let privileged = config
            .privileged_categories
            .iter()
            .filter_map(|name| match name.parse::<NotificationCategory>() {
                Ok(category) => Some(category),
                Err(e) => {
                    warn!(category = %name, error = %e, "Ignoring unknown privileged category");
                    None
                }
            })
            .collect();

        Self {
            notifications,
            gate,
            privileged,
            max_page_size: config.max_page_size,
        }
    }

    /// Validate, authorize, gate, and persist a notification.
    ///
    /// `ctx` is `None` for unauthenticated callers, which are rejected.
    pub async fn create(
        &self,
        ctx: Option<&RequestContext>,
        request: NewNotification,
    ) -> Result<CreateOutcome, AppError> {
        let ctx = ctx.ok_or_else(|| AppError::authentication("Authentication required"))?;

        let target = request
            .target_user_id
            .ok_or_else(|| AppError::missing_field("target_user_id"))?;
        let category = required(request.category.as_deref(), "category")?
            .parse::<NotificationCategory>()?;
        let title = required(request.title.as_deref(), "title")?;
        let body = required(request.body.as_deref(), "body")?;
        let link = request
            .link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        if self.privileged.contains(&category) && !ctx.is_privileged() {
            return Err(AppError::authorization(format!(
                "Only the system or an admin may create '{category}' notifications"
            )));
        }

        if !self.gate.should_deliver(target, category).await? {
            debug!(
                user_id = %target,
                category = %category,
                "Notification skipped: category disabled by user"
            );
            return Ok(CreateOutcome::Skipped {
                reason: SkipReason::PreferenceDisabled,
            });
        }

        let notification = Notification::new(target, category, title, body, link);
        self.notifications.insert(&notification).await?;

        info!(
            notification_id = %notification.id,
            user_id = %target,
            category = %category,
            created_by = %ctx.username,
            "Notification created"
        );
        Ok(CreateOutcome::Created(notification))
    }

    /// One page of a user's notifications, oldest first.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: u64,
        page_size: u64,
        unread_only: bool,
    ) -> Result<NotificationPage, AppError> {
        let request = PageRequest::try_new(page, page_size, self.max_page_size)?;
        let filter = NotificationFilter { unread_only };

        let (items, total_count) = self
            .notifications
            .list_for_user(user_id, filter, &request)
            .await?;
        let unread_count = self.notifications.unread_count(user_id).await?;

        Ok(NotificationPage {
            items,
            total_count,
            unread_count,
            page: request.page,
            page_size: request.page_size,
        })
    }

    /// Number of unread notifications the user owns.
    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, AppError> {
        self.notifications.unread_count(user_id).await
    }

    /// Mark one notification read on behalf of its owner. Idempotent.
    pub async fn mark_read(
        &self,
        notification_id: NotificationId,
        requesting_user: UserId,
    ) -> Result<Notification, AppError> {
        let existing = self
            .notifications
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| not_found(notification_id))?;

        if existing.user_id != requesting_user {
            return Err(AppError::authorization(
                "Notification belongs to another user",
            ));
        }
        if existing.is_read {
            return Ok(existing);
        }

        let updated = self
            .notifications
            .mark_read(notification_id, Utc::now())
            .await?
            .ok_or_else(|| not_found(notification_id))?;
        debug!(notification_id = %notification_id, user_id = %requesting_user, "Notification marked read");
        Ok(updated)
    }

    /// Mark every unread notification of the user read; returns how many changed.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, AppError> {
        let count = self.notifications.mark_all_read(user_id, Utc::now()).await?;
        debug!(user_id = %user_id, count, "Marked all notifications read");
        Ok(count)
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_field(field))
}

fn not_found(id: NotificationId) -> AppError {
    AppError::not_found(format!("Notification {id} not found"))
}
