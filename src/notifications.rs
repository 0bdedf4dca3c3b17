use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

const MAX_PENDING: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Toast sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Clipboard write capability. `Err` carries the rejection reason.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Pending toasts, drained by the UI on each poll.
#[derive(Default)]
pub struct NotificationCenter {
    pending: Mutex<VecDeque<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.pending().drain(..).collect()
    }

    // Poisoned queues are recovered so toasts keep flowing.
    fn pending(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.pending.lock().unwrap_or_else(|e| {
            warn!("Notification queue lock poisoned: {}", e);
            e.into_inner()
        })
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        info!(
            "[toast:{:?}] {}: {}",
            notification.level, notification.title, notification.message
        );
        let mut pending = self.pending();
        if pending.len() == MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(notification);
    }
}

/// Holds the last copied text; the page performs the browser-side copy.
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), String> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|e| format!("Clipboard lock failed: {}", e))?;
        *contents = Some(text.to_string());
        Ok(())
    }
}
