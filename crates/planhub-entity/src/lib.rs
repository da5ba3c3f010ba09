//! # planhub-entity
//!
//! Domain entity models for the PlanHub notification core. Every struct in
//! this crate is either a stored record or a domain value object. All
//! entities derive `Debug`, `Clone`, `Serialize`, and `Deserialize`; row
//! mapping lives in `planhub-database`.

pub mod notification;
pub mod user;
