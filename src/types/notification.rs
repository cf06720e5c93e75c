//! User-facing notification and navigation types

use serde::{Deserialize, Serialize};

/// Module tag attached to every notification this crate pushes.
pub const NOTIFICATION_MODULE: &str = "muninn";

/// Severity of a pushed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStyle {
    Info,
    Warn,
    Critical,
}

/// A notification handed to the consumer's [`Notifier`](crate::traits::Notifier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub module: String,
    pub style: NotificationStyle,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn new(style: NotificationStyle, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            module: NOTIFICATION_MODULE.to_owned(),
            style,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Create an INFO notification
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Info, title, description)
    }

    /// Create a WARN notification
    pub fn warn(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Warn, title, description)
    }

    /// Create a CRITICAL notification
    pub fn critical(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Critical, title, description)
    }
}

/// Routes the middleware chain can send the consumer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The access-denied page (403).
    Forbidden,
}
