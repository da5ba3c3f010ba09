//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use planhub_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::serializer::serialize_outbound;
use crate::message::types::OutboundMessage;
use crate::metrics::EngineMetrics;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Timeout before considering connection dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and marks the connection dead if no pong arrives
/// within the timeout. Returns once the connection is shut down.
pub async fn run_heartbeat(
    handle: Arc<ConnectionHandle>,
    config: HeartbeatConfig,
    metrics: Arc<EngineMetrics>,
) {
    let mut interval = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    let shutdown = handle.shutdown_token().clone();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        if !handle.is_alive() {
            break;
        }

        let since_pong = handle.last_pong().elapsed();
        if since_pong > config.ping_timeout {
            warn!(
                conn_id = %handle.id,
                since_pong_ms = since_pong.as_millis() as u64,
                "Heartbeat timeout, closing connection"
            );
            metrics.record_heartbeat_timeout();
            handle.mark_dead();
            break;
        }

        let ping = OutboundMessage::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        let Ok(payload) = serialize_outbound(&ping) else {
            continue;
        };
        if let Err(e) = handle.try_deliver(payload) {
            debug!(conn_id = %handle.id, error = %e, "Ping not queued");
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn config() -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(25),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_connection_times_out() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(tx, CancellationToken::new()));
        let metrics = Arc::new(EngineMetrics::new());

        run_heartbeat(handle.clone(), config(), metrics.clone()).await;

        assert!(!handle.is_alive());
        assert_eq!(metrics.snapshot().heartbeat_timeouts, 1);
        let first = rx.recv().await.unwrap();
        assert!(first.contains("\"type\":\"ping\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pongs_keep_connection_alive() {
        let (tx, _rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(tx, CancellationToken::new()));
        let metrics = Arc::new(EngineMetrics::new());

        let task = tokio::spawn(run_heartbeat(handle.clone(), config(), metrics.clone()));
        for _ in 0..6 {
            time::sleep(Duration::from_secs(10)).await;
            handle.record_pong();
        }
        assert!(handle.is_alive());

        handle.shutdown_token().cancel();
        task.await.unwrap();
        assert_eq!(metrics.snapshot().heartbeat_timeouts, 0);
    }
}
