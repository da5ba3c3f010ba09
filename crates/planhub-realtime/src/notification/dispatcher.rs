//! Fan-out dispatcher: best-effort push to every connection in a room.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use planhub_entity::notification::Notification;

use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::message::serializer::serialize_outbound;
use crate::message::types::{BroadcastMessage, OutboundMessage};
use crate::metrics::EngineMetrics;

/// Per-push delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Handles a send was attempted on.
    pub attempted: usize,
    /// Handles the message was queued for.
    pub delivered: usize,
    /// Handles that were closed or full.
    pub failed: usize,
}

/// Pushes serialized events to live connections.
///
/// Never returns an error: persistence has already happened by the time a
/// push runs, so per-handle failures are logged and counted only.
#[derive(Debug)]
pub struct FanoutDispatcher {
    /// Room lookup.
    registry: Arc<ConnectionRegistry>,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
}

impl FanoutDispatcher {
    /// Create a new dispatcher
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<EngineMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Push a persisted notification to every connection of its recipient.
    pub fn push(&self, notification: &Notification) -> DeliveryReport {
        let members = self.registry.members_of(notification.user_id);
        if members.is_empty() {
            debug!(
                notification_id = %notification.id,
                user_id = %notification.user_id,
                "Recipient offline, skipping push"
            );
            return DeliveryReport::default();
        }

        let report = self.deliver(
            &members,
            &OutboundMessage::Notification(notification.clone()),
        );
        self.metrics.record_notification();
        debug!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            delivered = report.delivered,
            failed = report.failed,
            "Notification pushed"
        );
        report
    }

    /// Push an announcement to every authenticated connection.
    pub fn broadcast_all(&self, message: &BroadcastMessage) -> DeliveryReport {
        let members = self.registry.all_members();
        let report = self.deliver(&members, &OutboundMessage::Broadcast(message.clone()));
        self.metrics.record_broadcast();
        debug!(
            broadcast_id = %message.id,
            attempted = report.attempted,
            delivered = report.delivered,
            "Broadcast sent"
        );
        report
    }

    fn deliver(&self, members: &[Arc<ConnectionHandle>], message: &OutboundMessage) -> DeliveryReport {
        let mut report = DeliveryReport {
            attempted: members.len(),
            ..DeliveryReport::default()
        };

        let payload = match serialize_outbound(message) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Failed to serialize outbound message");
                report.failed = members.len();
                self.metrics.record_delivery(0, report.failed as u64);
                return report;
            }
        };

        for handle in members {
            match handle.try_deliver(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(conn_id = %handle.id, error = %e, "Push to connection failed");
                    report.failed += 1;
                }
            }
        }

        self.metrics
            .record_delivery(report.delivered as u64, report.failed as u64);
        report
    }
}
