//! Preference gate and notification store service.

pub mod gate;
pub mod service;

pub use gate::PreferenceGate;
pub use service::{CreateOutcome, NewNotification, NotificationService, SkipReason};
