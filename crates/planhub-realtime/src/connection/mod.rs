//! WebSocket connection management: handles, registry, handshake, heartbeat.

pub mod authenticator;
pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod registry;

pub use authenticator::HandshakeAuthenticator;
pub use handle::{ConnectionHandle, DeliveryError};
pub use manager::ConnectionManager;
pub use registry::{ConnectionRegistry, JoinOutcome};
