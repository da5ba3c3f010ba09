//! Server-to-client realtime events.

use serde::{Deserialize, Serialize};

use planhub_core::types::id::UserId;
use planhub_entity::notification::Notification;

/// A frame received on the realtime channel.
///
/// Mirrors the server's outbound vocabulary. Unknown frame types decode as
/// [`ServerEvent::Other`] so newer servers don't break older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The handshake was accepted.
    AuthSuccess {
        /// The user this connection now receives pushes for.
        user_id: UserId,
    },
    /// The handshake was rejected.
    AuthError {
        /// Reason.
        message: String,
    },
    /// A notification created for this user.
    Notification(Notification),
    /// A system broadcast sent to every authenticated connection.
    Broadcast {
        /// Title.
        title: String,
        /// Body.
        body: String,
        /// Severity label.
        severity: String,
    },
    /// Server liveness probe; answer with a pong.
    Ping {
        /// Echoed back in the pong.
        timestamp: i64,
    },
    /// Reply to a client ping.
    Pong {
        /// Timestamp from the ping.
        timestamp: i64,
    },
    /// Protocol error.
    Error {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
    /// Any frame type this client does not understand.
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ping_and_unknown() {
        let ev: ServerEvent = serde_json::from_str(r#"{"type":"ping","timestamp":7}"#).unwrap();
        assert_eq!(ev, ServerEvent::Ping { timestamp: 7 });

        let ev: ServerEvent =
            serde_json::from_str(r#"{"type":"presence_update","user_id":"x"}"#).unwrap();
        assert_eq!(ev, ServerEvent::Other);
    }

    #[test]
    fn test_decode_broadcast_ignores_extra_fields() {
        let raw = r#"{"type":"broadcast","id":"6c1f0e9e-8b1f-4c2e-9a53-0b9a8d3f3c11","title":"Maintenance","body":"Tonight","severity":"warning","timestamp":"2026-01-01T00:00:00Z"}"#;
        let ev: ServerEvent = serde_json::from_str(raw).unwrap();
        assert!(matches!(ev, ServerEvent::Broadcast { ref severity, .. } if severity == "warning"));
    }
}
