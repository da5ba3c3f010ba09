//! # planhub-service
//!
//! Business logic for the notification core. Each service orchestrates
//! the repositories behind the `planhub-database` traits.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod notification;
pub mod preference;

pub use context::RequestContext;
pub use notification::{
    CreateOutcome, NewNotification, NotificationService, PreferenceGate, SkipReason,
};
pub use preference::PreferenceService;
