//! User-facing notifications.
//!
//! Producers (the upload flow, the global mutation error hook) publish typed
//! [`Notification`]s on a [`NotificationBus`]; the [`toast::Toaster`] is the
//! single subscriber that puts them on screen.

pub mod toast;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Severity of a notification, controls how the toast is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Broadcast channel for notifications.
///
/// Events are delivered synchronously, in publish order, to every handler
/// subscribed at the time of the call. There is no buffering: publishing
/// with no subscriber drops the event.
#[derive(Clone, Default)]
pub struct NotificationBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, message: impl Into<String>, severity: Severity) {
        self.publish_notification(Notification::new(message, severity));
    }

    pub fn publish_notification(&self, notification: Notification) {
        // Handlers run outside the lock so they may publish or subscribe themselves.
        let handlers: Vec<Handler> = match self.subscribers.lock() {
            Ok(subs) => subs.handlers.iter().map(|(_, h)| h.clone()).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .handlers
                .iter()
                .map(|(_, h)| h.clone())
                .collect(),
        };

        if handlers.is_empty() {
            log::debug!(
                "Dropping {} notification with no subscriber: {}",
                notification.severity.as_str(),
                notification.message
            );
            return;
        }

        for handler in handlers {
            handler(&notification);
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = subs.next_id;
        subs.next_id += 1;
        subs.handlers.push((id, Arc::new(handler)));

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.handlers.len())
            .unwrap_or(0)
    }
}

/// Handle returned by [`NotificationBus::subscribe`]. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    subscribers: std::sync::Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            let mut subs = subscribers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            subs.handlers.retain(|(id, _)| *id != self.id);
        }
    }
}
