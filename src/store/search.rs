//! Debounced per-repository search filter.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::container::Container;
use super::debounce::Debouncer;
use super::storage::{StorageAdapter, Subscription};

/// Quiet window applied to search filter writes.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// One repository's branch search text.
///
/// Writes are coalesced: only the last value set within the quiet window is
/// persisted, and [`SearchFilter::query`] reflects the persisted value, so it
/// lags behind [`SearchFilter::set`] by up to one window. Clearing is applied
/// immediately.
pub struct SearchFilter {
    container: Container<String>,
    debouncer: Debouncer<String>,
}

impl SearchFilter {
    pub fn new(storage: Arc<dyn StorageAdapter>, key: impl Into<String>, delay: Duration) -> Self {
        let container = Container::new(storage, key, String::new());
        let target = container.clone();
        let debouncer = Debouncer::new(delay, move |value: String| target.set(value));
        Self {
            container,
            debouncer,
        }
    }

    pub fn key(&self) -> &str {
        self.container.key()
    }

    /// Schedule `value` as the new filter.
    pub fn set(&self, value: impl Into<String>) {
        self.debouncer.schedule(value.into());
    }

    /// The persisted filter.
    pub fn query(&self) -> String {
        self.container.get()
    }

    /// Reset the filter now, discarding any pending write. A write already
    /// running on a timer thread lands before the reset.
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.container.set(String::new());
    }

    /// Persist the pending value without waiting for the window.
    pub fn flush(&self) -> bool {
        self.debouncer.flush()
    }

    /// Discard the pending value.
    pub fn cancel(&self) -> Option<String> {
        self.debouncer.cancel()
    }

    pub fn pending(&self) -> Option<String> {
        self.debouncer.pending()
    }

    /// Advance the debounce timer when running without a tokio runtime.
    pub fn tick(&self) -> bool {
        self.debouncer.tick()
    }

    pub fn subscribe(&self, observer: impl Fn(&String) + Send + Sync + 'static) -> Subscription {
        self.container.subscribe(observer)
    }
}

impl fmt::Debug for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchFilter")
            .field("key", &self.container.key())
            .field("query", &self.container.get())
            .field("debouncer", &self.debouncer)
            .finish()
    }
}
