//! # planhub-auth
//!
//! Bearer-token authentication for the notification core.
//!
//! ## Modules
//!
//! - `jwt` — token creation and validation
//! - `principal` — the identity a request or connection acts as

pub mod jwt;
pub mod principal;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenRole};
pub use principal::Principal;
