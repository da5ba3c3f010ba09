//! Notification category enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use planhub_core::error::AppError;

/// Category of a notification; drives preference lookup and filtering.
///
/// The set is closed: anything else is rejected at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Announcements from the platform itself.
    System,
    /// Someone invited the user to a plan.
    Invitation,
    /// A direct or plan message.
    Message,
    /// Someone liked the user's plan or comment.
    Like,
    /// Someone joined one of the user's plans.
    Join,
    /// An upcoming plan reminder.
    Reminder,
}

impl NotificationCategory {
    /// Every category, in declaration order.
    pub const ALL: [NotificationCategory; 6] = [
        Self::System,
        Self::Invitation,
        Self::Message,
        Self::Like,
        Self::Join,
        Self::Reminder,
    ];

    /// Return the category as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Invitation => "invitation",
            Self::Message => "message",
            Self::Like => "like",
            Self::Join => "join",
            Self::Reminder => "reminder",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| AppError::invalid_category(s))
    }
}
