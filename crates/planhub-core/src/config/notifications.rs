//! Notification store configuration.

use serde::{Deserialize, Serialize};

/// Settings for notification creation and listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Upper bound applied to the requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Categories only the system or an admin may create, by wire name.
    #[serde(default = "default_privileged")]
    pub privileged_categories: Vec<String>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            privileged_categories: default_privileged(),
        }
    }
}

fn default_max_page_size() -> u64 {
    100
}

fn default_privileged() -> Vec<String> {
    vec!["system".to_string()]
}
