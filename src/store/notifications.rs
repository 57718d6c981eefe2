//! Persisted notifications shared by every view.

use std::sync::Arc;

use super::container::Container;
use super::storage::{StorageAdapter, Subscription};
use crate::data::Notification;

/// Storage key of the notification list.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// User-facing notifications, newest first.
#[derive(Debug, Clone)]
pub struct Notifications {
    inner: Container<Vec<Notification>>,
}

impl Notifications {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner: Container::new(storage, NOTIFICATIONS_KEY, Vec::new()),
        }
    }

    /// Stamp `notification` and put it at the head of the list. Returns the
    /// stored notification, including its id.
    pub fn push(&self, notification: Notification) -> Notification {
        let notification = notification.stamped();
        let stored = notification.clone();
        self.inner.update(move |list| {
            let mut next = Vec::with_capacity(list.len() + 1);
            next.push(notification);
            next.extend(list.iter().cloned());
            next
        });
        stored
    }

    /// Drop the notification with `id`. Returns whether one was removed.
    pub fn remove(&self, id: &str) -> bool {
        let present = self
            .inner
            .with(|list| list.iter().any(|n| n.id.as_deref() == Some(id)));
        if !present {
            return false;
        }
        self.inner.update(|list| {
            list.iter()
                .filter(|n| n.id.as_deref() != Some(id))
                .cloned()
                .collect()
        });
        true
    }

    /// The most recent notification.
    pub fn last(&self) -> Option<Notification> {
        self.inner.with(|list| list.first().cloned())
    }

    pub fn list(&self) -> Vec<Notification> {
        self.inner.get()
    }

    pub fn len(&self) -> usize {
        self.inner.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.with(Vec::is_empty)
    }

    pub fn clear(&self) {
        self.inner.set(Vec::new());
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&Vec<Notification>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(observer)
    }
}
