//! User entities, reduced to what the notification core consumes.

pub mod model;
pub mod role;

pub use model::User;
pub use role::UserRole;
