//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use planhub_core::types::id::UserId;
use planhub_entity::notification::Notification;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Identify the connection as a user.
    Authenticate {
        /// The user this connection acts for.
        user_id: UserId,
        /// Access token; required when the server enforces tokens.
        #[serde(default)]
        token: Option<String>,
    },
    /// Client keepalive; answered with `pong`.
    Ping {
        /// Optional client timestamp, echoed back.
        #[serde(default)]
        timestamp: Option<i64>,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// A system-wide announcement pushed to every connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Broadcast ID.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Severity level (`info`, `warning`, `critical`).
    pub severity: String,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
}

impl BroadcastMessage {
    /// Build a broadcast stamped with a new id and the current time.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            severity: severity.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Handshake accepted.
    AuthSuccess {
        /// The user the connection is now registered under.
        user_id: UserId,
    },
    /// Handshake rejected.
    AuthError {
        /// Reason.
        message: String,
    },
    /// A notification for the connection's user.
    Notification(Notification),
    /// System-wide announcement.
    Broadcast(BroadcastMessage),
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp.
        timestamp: i64,
    },
    /// Reply to a client ping.
    Pong {
        /// Echoed client timestamp or server time.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}
