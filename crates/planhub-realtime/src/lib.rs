//! # planhub-realtime
//!
//! Real-time delivery for PlanHub notifications. Provides:
//!
//! - A connection registry grouping live WebSocket connections into
//!   per-user rooms
//! - The in-band `authenticate` handshake and ping/pong heartbeat
//! - Best-effort fan-out of persisted notifications and broadcasts
//! - The two-phase create-then-push pipeline

pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod server;

pub use connection::{ConnectionHandle, ConnectionManager, ConnectionRegistry};
pub use notification::{CreationReceipt, DeliveryReport, FanoutDispatcher, NotificationPipeline};
pub use server::RealtimeEngine;
