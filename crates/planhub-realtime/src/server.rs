//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use planhub_auth::jwt::JwtDecoder;
use planhub_core::config::RealtimeConfig;
use planhub_database::repositories::UserRepository;

use crate::connection::authenticator::HandshakeAuthenticator;
use crate::connection::manager::ConnectionManager;
use crate::connection::registry::ConnectionRegistry;
use crate::metrics::EngineMetrics;
use crate::notification::dispatcher::FanoutDispatcher;

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// User rooms.
    pub registry: Arc<ConnectionRegistry>,
    /// Connection lifecycle and handshake.
    pub connections: Arc<ConnectionManager>,
    /// Fan-out dispatcher.
    pub dispatcher: Arc<FanoutDispatcher>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Cancelled on shutdown; every connection token is a child of it.
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("rooms", &self.registry.room_count())
            .field("connections", &self.connections.open_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(
        config: RealtimeConfig,
        users: Arc<dyn UserRepository>,
        decoder: Arc<JwtDecoder>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let authenticator = HandshakeAuthenticator::new(users, decoder, config.require_token);
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            registry.clone(),
            authenticator,
            metrics.clone(),
            shutdown.clone(),
        ));
        let dispatcher = Arc::new(FanoutDispatcher::new(registry.clone(), metrics.clone()));

        info!(
            require_token = config.require_token,
            buffer = config.channel_buffer_size,
            "Real-time engine initialized"
        );

        Self {
            registry,
            connections,
            dispatcher,
            metrics,
            shutdown,
        }
    }

    /// Token cancelled when the engine shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.shutdown.cancel();
        self.connections.close_all();
        info!("Real-time engine shut down");
    }
}
