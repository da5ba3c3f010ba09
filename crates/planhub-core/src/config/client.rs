//! Client reconciliation cache configuration.

use serde::{Deserialize, Serialize};

/// Settings for the client-side notification cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the notification API, e.g. `http://localhost:8080`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Minimum seconds between two successful fetches unless forced.
    #[serde(default = "default_min_refresh_interval")]
    pub min_refresh_interval_seconds: u64,
    /// Skip fetches entirely once data is loaded, unless forced.
    #[serde(default)]
    pub skip_when_loaded: bool,
    /// Page size requested on each fetch.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            min_refresh_interval_seconds: default_min_refresh_interval(),
            skip_when_loaded: false,
            page_size: default_page_size(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_min_refresh_interval() -> u64 {
    10
}

fn default_page_size() -> u64 {
    50
}

fn default_request_timeout() -> u64 {
    15
}
