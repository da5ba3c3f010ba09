//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections opened
    connections_total: AtomicU64,
    /// Connections currently open
    connections_active: AtomicU64,
    /// Successful handshakes
    authentications: AtomicU64,
    /// Rejected handshakes
    auth_failures: AtomicU64,
    /// Inbound frames processed
    messages_received: AtomicU64,
    /// Outbound messages queued
    messages_sent: AtomicU64,
    /// Per-handle delivery failures
    delivery_failures: AtomicU64,
    /// Notifications pushed
    notifications_pushed: AtomicU64,
    /// Broadcasts sent
    broadcasts: AtomicU64,
    /// Connections closed by heartbeat timeout
    heartbeat_timeouts: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was opened
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection was closed
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Record a handshake result
    pub fn record_auth(&self, success: bool) {
        let counter = if success {
            &self.authentications
        } else {
            &self.auth_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message received from a client
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one fan-out
    pub fn record_delivery(&self, delivered: u64, failed: u64) {
        self.messages_sent.fetch_add(delivered, Ordering::Relaxed);
        self.delivery_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Record a notification push
    pub fn record_notification(&self) {
        self.notifications_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a broadcast
    pub fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a heartbeat timeout
    pub fn record_heartbeat_timeout(&self) {
        self.heartbeat_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            authentications: self.authentications.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            notifications_pushed: self.notifications_pushed.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            heartbeat_timeouts: self.heartbeat_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever opened
    pub connections_total: u64,
    /// Currently open connections
    pub connections_active: u64,
    /// Successful handshakes
    pub authentications: u64,
    /// Rejected handshakes
    pub auth_failures: u64,
    /// Inbound frames processed
    pub messages_received: u64,
    /// Outbound messages queued
    pub messages_sent: u64,
    /// Per-handle delivery failures
    pub delivery_failures: u64,
    /// Notifications pushed
    pub notifications_pushed: u64,
    /// Broadcasts sent
    pub broadcasts: u64,
    /// Heartbeat timeouts
    pub heartbeat_timeouts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_never_underflows() {
        let metrics = EngineMetrics::new();
        metrics.connection_closed();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.connection_closed();
        let snap = metrics.snapshot();
        assert_eq!(snap.connections_total, 1);
        assert_eq!(snap.connections_active, 0);
    }
}
