//! JSON serialization for WebSocket messages.

use super::types::{InboundMessage, OutboundMessage};

/// Serialize an outbound message to its wire form
pub fn serialize_outbound(msg: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize an inbound message from JSON
pub fn deserialize_inbound(text: &str) -> Result<InboundMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Whether `text` is a JSON object whose `type` is `authenticate`, even if
/// the rest of it does not parse.
pub fn is_authenticate_frame(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type")?.as_str().map(|t| t == "authenticate"))
        .unwrap_or(false)
}
