//! Core type definitions used across the PlanHub workspace.

pub mod id;
pub mod pagination;

pub use id::*;
pub use pagination::PageRequest;
