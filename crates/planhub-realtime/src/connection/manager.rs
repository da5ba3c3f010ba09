//! Connection manager: connection lifecycle and in-band handshake.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use planhub_core::config::RealtimeConfig;
use planhub_core::types::id::{ConnectionId, UserId};

use crate::message::serializer::{deserialize_inbound, is_authenticate_frame, serialize_outbound};
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::EngineMetrics;

use super::authenticator::HandshakeAuthenticator;
use super::handle::ConnectionHandle;
use super::heartbeat::HeartbeatConfig;
use super::registry::{ConnectionRegistry, JoinOutcome};

/// Manages every open WebSocket connection, authenticated or not.
#[derive(Debug)]
pub struct ConnectionManager {
    /// User rooms.
    registry: Arc<ConnectionRegistry>,
    /// All open connections, including ones that never authenticated.
    open: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Handshake authenticator.
    authenticator: HandshakeAuthenticator,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
    /// Configuration.
    config: RealtimeConfig,
    /// Parent of every connection's shutdown token.
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        registry: Arc<ConnectionRegistry>,
        authenticator: HandshakeAuthenticator,
        metrics: Arc<EngineMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            open: DashMap::new(),
            authenticator,
            metrics,
            config,
            shutdown,
        }
    }

    /// Open a new, unauthenticated connection.
    ///
    /// Returns the handle and the receiver the writer task drains.
    pub fn open(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx, self.shutdown.child_token()));

        self.open.insert(handle.id, handle.clone());
        self.metrics.connection_opened();
        debug!(conn_id = %handle.id, "WebSocket connection opened");

        (handle, rx)
    }

    /// Processes an inbound text frame from a client.
    pub async fn handle_inbound(&self, handle: &Arc<ConnectionHandle>, raw_message: &str) {
        self.metrics.record_received();

        let msg = match deserialize_inbound(raw_message) {
            Ok(m) => m,
            Err(e) if is_authenticate_frame(raw_message) => {
                self.metrics.record_auth(false);
                warn!(conn_id = %handle.id, error = %e, "Malformed authenticate message");
                self.reply(
                    handle,
                    &OutboundMessage::AuthError {
                        message: format!("Malformed authenticate message: {e}"),
                    },
                );
                return;
            }
            Err(e) => {
                self.reply(
                    handle,
                    &OutboundMessage::Error {
                        code: "INVALID_MESSAGE".to_string(),
                        message: format!("Failed to parse message: {e}"),
                    },
                );
                return;
            }
        };

        match msg {
            InboundMessage::Authenticate { user_id, token } => {
                self.handle_authenticate(handle, user_id, token.as_deref())
                    .await;
            }
            InboundMessage::Ping { timestamp } => {
                let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
                self.reply(handle, &OutboundMessage::Pong { timestamp });
            }
            InboundMessage::Pong { .. } => {
                handle.record_pong();
            }
        }
    }

    async fn handle_authenticate(
        &self,
        handle: &Arc<ConnectionHandle>,
        user_id: UserId,
        token: Option<&str>,
    ) {
        match self.authenticator.authenticate(user_id, token).await {
            Ok(user) => {
                // close() may have run during the lookup; it marks the handle
                // dead before leaving, so a dead handle never stays in a room.
                if !handle.is_alive() {
                    debug!(conn_id = %handle.id, "Connection closed during handshake");
                    return;
                }
                let outcome = self.registry.join(user.id, handle.clone());
                if !handle.is_alive() {
                    self.registry.leave(handle.id);
                    debug!(conn_id = %handle.id, "Connection closed during handshake");
                    return;
                }
                self.metrics.record_auth(true);
                match outcome {
                    JoinOutcome::Moved { from } => info!(
                        conn_id = %handle.id,
                        from = %from,
                        user_id = %user.id,
                        "Connection re-authenticated as another user"
                    ),
                    _ => info!(
                        conn_id = %handle.id,
                        user_id = %user.id,
                        username = %user.username,
                        "Connection authenticated"
                    ),
                }
                self.reply(handle, &OutboundMessage::AuthSuccess { user_id: user.id });
            }
            Err(e) => {
                self.metrics.record_auth(false);
                warn!(conn_id = %handle.id, user_id = %user_id, error = %e, "Authentication failed");
                self.reply(
                    handle,
                    &OutboundMessage::AuthError {
                        message: e.message,
                    },
                );
            }
        }
    }

    /// Queue a direct reply; failures are logged and dropped.
    fn reply(&self, handle: &ConnectionHandle, message: &OutboundMessage) {
        let payload = match serialize_outbound(message) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Failed to serialize outbound message");
                return;
            }
        };
        if let Err(e) = handle.try_deliver(payload) {
            warn!(conn_id = %handle.id, error = %e, "Failed to queue reply");
        }
    }

    /// Tear down a connection. Leaves its room immediately; a no-op on the
    /// registry when it never authenticated. Safe to call more than once.
    pub fn close(&self, handle: &ConnectionHandle) {
        handle.mark_dead();
        let left = self.registry.leave(handle.id);
        if self.open.remove(&handle.id).is_some() {
            self.metrics.connection_closed();
            info!(
                conn_id = %handle.id,
                user_id = ?left,
                "WebSocket connection closed"
            );
        }
    }

    /// Signal every open connection to shut down and drop them from the registry.
    pub fn close_all(&self) {
        let all: Vec<Arc<ConnectionHandle>> =
            self.open.iter().map(|entry| entry.value().clone()).collect();
        for handle in &all {
            self.close(handle);
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Heartbeat settings for connection tasks.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from(&self.config)
    }

    /// Number of open connections, authenticated or not.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Returns a reference to the registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns a reference to the metrics.
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }
}
