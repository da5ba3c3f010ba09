//! Individual WebSocket connection handle.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use planhub_core::types::id::ConnectionId;

/// Why a message could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection has closed or its writer is gone.
    #[error("connection closed")]
    Closed,
    /// The outbound queue is at capacity.
    #[error("send buffer full")]
    Full,
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender side of the connection's bounded outbound queue. The
/// handle itself knows nothing about which user it belongs to; room
/// membership lives in the registry.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// When the connection was opened
    pub connected_at: DateTime<Utc>,
    /// Sender for serialized outbound messages
    sender: mpsc::Sender<String>,
    /// Last pong (or open time)
    last_pong: Mutex<Instant>,
    /// Whether the connection is still alive
    alive: AtomicBool,
    /// Cancelled when the connection must shut down
    shutdown: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(sender: mpsc::Sender<String>, shutdown: CancellationToken) -> Self {
        Self {
            id: ConnectionId::new(),
            connected_at: Utc::now(),
            sender,
            last_pong: Mutex::new(Instant::now()),
            alive: AtomicBool::new(true),
            shutdown,
        }
    }

    /// Queue a serialized message without waiting.
    pub fn try_deliver(&self, payload: String) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Closed);
        }
        match self.sender.try_send(payload) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(DeliveryError::Full),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(DeliveryError::Closed)
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead and signal its tasks to stop
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.shutdown.cancel();
    }

    /// Record a pong response
    pub fn record_pong(&self) {
        *self.last_pong.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    /// Time of the last pong
    pub fn last_pong(&self) -> Instant {
        *self.last_pong.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Token cancelled when this connection is told to close
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
