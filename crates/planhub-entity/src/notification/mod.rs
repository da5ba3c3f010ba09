//! Notification domain entities.

pub mod category;
pub mod model;
pub mod preference;

pub use category::NotificationCategory;
pub use model::{Notification, NotificationPage};
pub use preference::PreferenceMap;
