//! Reactive value container backed by one storage key.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::storage::{read_json, store_json, StorageAdapter, Subscription};

/// Values a [`Container`] can hold.
pub trait Persisted:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Persisted for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Called with the new value after every applied change.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    key: String,
    default: T,
    storage: Arc<dyn StorageAdapter>,
    value: Mutex<T>,
    observers: Mutex<Vec<(u64, Observer<T>)>>,
    next_observer: AtomicU64,
    external: Mutex<Option<Subscription>>,
}

impl<T: Persisted> Inner<T> {
    fn notify(&self, value: &T) {
        let observers: Vec<Observer<T>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(value);
        }
    }

    /// Re-read the persisted value and apply it if it differs.
    ///
    /// The read happens under the value lock so a concurrent local write
    /// cannot be overwritten by an older persisted value.
    fn reconcile(&self) -> bool {
        let persisted = {
            let mut current = self.value.lock();
            let persisted = read_json(self.storage.as_ref(), &self.key, self.default.clone());
            if *current == persisted {
                return false;
            }
            *current = persisted.clone();
            persisted
        };
        tracing::debug!(key = %self.key, "Applied externally persisted value");
        self.notify(&persisted);
        true
    }
}

/// A single observable value persisted under one storage key.
///
/// Clones share the same underlying state.
pub struct Container<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Container<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Persisted> Container<T> {
    /// Bind a container to `key`, loading the persisted value or `default`.
    pub fn new(storage: Arc<dyn StorageAdapter>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let value = read_json(storage.as_ref(), &key, default.clone());
        let inner = Arc::new(Inner {
            key,
            default,
            storage,
            value: Mutex::new(value),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(1),
            external: Mutex::new(None),
        });

        let weak: Weak<Inner<T>> = Arc::downgrade(&inner);
        let subscription = inner.storage.subscribe(
            &inner.key,
            Arc::new(move |_key: &str| {
                if let Some(inner) = weak.upgrade() {
                    inner.reconcile();
                }
            }),
        );
        *inner.external.lock() = Some(subscription);

        Self { inner }
    }

    /// The storage key this container is bound to.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.lock();
        f(&*value)
    }

    /// Replace the value, persist it and notify observers.
    pub fn set(&self, value: T) {
        self.update(|_| value);
    }

    /// Derive the next value from the current one, persist it and notify
    /// observers.
    ///
    /// The value is persisted while locked, so the stored order of writes
    /// matches the in-memory order. Other views hear about it only after the
    /// lock is released.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let (next, broadcast) = {
            let mut current = self.inner.value.lock();
            let next = f(&*current);
            *current = next.clone();
            let broadcast = store_json(self.inner.storage.as_ref(), &self.inner.key, &next);
            (next, broadcast)
        };
        self.inner.notify(&next);
        broadcast.deliver();
    }

    /// Re-read the persisted value; observers are only notified when it
    /// differs from the in-memory one. Returns whether the value changed.
    pub fn reload(&self) -> bool {
        self.inner.reconcile()
    }

    /// Observe every applied change until the returned guard is dropped.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_observer.fetch_add(1, Ordering::Relaxed);
        self.inner
            .observers
            .lock()
            .push((id, Arc::new(observer)));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.lock().retain(|(observer_id, _)| *observer_id != id);
            }
        })
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Whether both handles point at the same underlying state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Container<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("key", &self.inner.key)
            .field("value", &*self.inner.value.lock())
            .finish()
    }
}
