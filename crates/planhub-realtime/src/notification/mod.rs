//! Notification fan-out and the create-then-push pipeline.

pub mod dispatcher;
pub mod pipeline;

pub use dispatcher::{DeliveryReport, FanoutDispatcher};
pub use pipeline::{CreationReceipt, NotificationPipeline};
