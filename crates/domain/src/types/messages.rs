//! Control-channel messages and host actions
//!
//! Messages the host page posts to the cache manager, the replies it gets
//! back, and the notification-related actions the host is asked to perform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stats::FetchStats;

/// Message sent by the host page over the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the installed generation without waiting for clients to close
    SkipWaiting,
    /// Ask for the active generation identifier
    GetVersion,
    /// Ask for a fetch statistics snapshot
    GetStats,
    /// Drop every entry of the active generation
    ClearCache,
}

/// Reply posted back over the message reply port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    Version { version: String },
    Stats { stats: FetchStats },
    Cleared { cleared: usize },
}

/// Payload of a push message (JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Button shown on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// Notification the host is asked to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub arrived_at: DateTime<Utc>,
}

/// Side effect requested from the host by a non-fetch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    None,
    ShowNotification(NotificationOptions),
    OpenWindow(String),
    /// Focus a client showing the URL, opening one if none exists.
    FocusOrOpen(String),
}
