//! # planhub-client
//!
//! Client-resident half of PlanHub notifications:
//!
//! - `cache` — the reconciliation cache holding the last-known feed
//! - `api` — the request/response API the cache reconciles against
//! - `realtime` — a WebSocket listener that feeds pushes into the cache

pub mod api;
pub mod cache;
pub mod event;
pub mod realtime;

pub use api::{HttpNotificationApi, NotificationApi, RemotePage};
pub use cache::{CacheSnapshot, DropReason, FetchOutcome, FetchPhase, PushDisposition, ReconciliationCache};
pub use event::ServerEvent;
pub use realtime::RealtimeListener;
