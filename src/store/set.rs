//! Set-valued container for branch names.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::container::Container;
use super::storage::{StorageAdapter, Subscription};

/// A persisted set of unique strings (selected or locked branch names).
#[derive(Debug, Clone)]
pub struct SetContainer {
    inner: Container<BTreeSet<String>>,
}

impl SetContainer {
    pub fn new(storage: Arc<dyn StorageAdapter>, key: impl Into<String>) -> Self {
        Self {
            inner: Container::new(storage, key, BTreeSet::new()),
        }
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    /// Union `items` into the set. Persists and notifies once per call, and
    /// not at all when every item was already present.
    pub fn add<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let missing = self.inner.with(|set| items.iter().any(|item| !set.contains(item)));
        if !missing {
            return;
        }
        self.inner.update(|set| {
            let mut next = set.clone();
            next.extend(items);
            next
        });
    }

    /// Remove every named item; absent items are ignored.
    pub fn remove<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<S> = items.into_iter().collect();
        let present = self
            .inner
            .with(|set| items.iter().any(|item| set.contains(item.as_ref())));
        if !present {
            return;
        }
        self.inner.update(|set| {
            let mut next = set.clone();
            for item in &items {
                next.remove(item.as_ref());
            }
            next
        });
    }

    pub fn has(&self, item: &str) -> bool {
        self.inner.with(|set| set.contains(item))
    }

    /// Reset to the empty set. Always persists and notifies, even when the
    /// set was already empty.
    pub fn clear(&self) {
        self.inner.set(BTreeSet::new());
    }

    /// Current members in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.inner.with(|set| set.iter().cloned().collect())
    }

    pub fn snapshot(&self) -> BTreeSet<String> {
        self.inner.get()
    }

    pub fn len(&self) -> usize {
        self.inner.with(BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.with(BTreeSet::is_empty)
    }

    /// Re-read the persisted set.
    pub fn reload(&self) -> bool {
        self.inner.reload()
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&BTreeSet<String>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(observer)
    }
}
