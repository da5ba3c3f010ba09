//! HTTP and WebSocket handlers.

pub mod broadcast;
pub mod health;
pub mod notification;
pub mod preference;
pub mod ws;
