//! Query parameters for the notification list endpoint.

use serde::{Deserialize, Serialize};

use planhub_core::types::pagination::DEFAULT_PAGE_SIZE;

/// `?page&limit&unread_only`. Bounds are enforced by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-based, default: 1).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Only return unread items.
    #[serde(default)]
    pub unread_only: bool,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}
