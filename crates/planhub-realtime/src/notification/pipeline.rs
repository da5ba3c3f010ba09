//! Create-then-push pipeline.
//!
//! Phase one persists through [`NotificationService::create`] and its
//! errors reach the caller. Phase two pushes the stored record and can
//! only report how many connections it reached.

use std::sync::Arc;

use planhub_core::error::AppError;
use planhub_service::RequestContext;
use planhub_service::notification::{CreateOutcome, NewNotification, NotificationService};

use super::dispatcher::{DeliveryReport, FanoutDispatcher};

/// What a creation request produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationReceipt {
    /// Persistence result.
    pub outcome: CreateOutcome,
    /// Push result; `None` when nothing was stored.
    pub delivery: Option<DeliveryReport>,
}

/// Persists a notification and then attempts real-time delivery.
#[derive(Debug, Clone)]
pub struct NotificationPipeline {
    service: Arc<NotificationService>,
    dispatcher: Arc<FanoutDispatcher>,
}

impl NotificationPipeline {
    /// Creates a new pipeline.
    pub fn new(service: Arc<NotificationService>, dispatcher: Arc<FanoutDispatcher>) -> Self {
        Self {
            service,
            dispatcher,
        }
    }

    /// Run both phases.
    pub async fn create(
        &self,
        ctx: Option<&RequestContext>,
        request: NewNotification,
    ) -> Result<CreationReceipt, AppError> {
        let outcome = self.service.create(ctx, request).await?;
        let delivery = outcome.notification().map(|n| self.dispatcher.push(n));
        Ok(CreationReceipt { outcome, delivery })
    }
}
