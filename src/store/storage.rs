//! Persisted key-value storage shared by every open view.
//!
//! A [`StorageHub`] is the device-level store: a durable [`KvBackend`] plus the
//! table of change listeners. Each view talks to it through its own
//! [`ViewStorage`], which tags writes with the view's [`ViewId`] so that change
//! notifications only reach *other* views. Values are JSON-encoded strings.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Raw string storage behind a [`StorageHub`].
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend, used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Identifies one open view of the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Called with the changed key when another view writes it.
pub type ChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Guard for a registered listener or observer; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never registered anywhere.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Unsubscribe now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Change handlers owed for one committed write.
///
/// Returned by [`StorageAdapter::store_raw`] so a writer can persist while
/// holding its own lock and notify other views only after releasing it.
#[must_use = "other views are only notified when the broadcast is delivered"]
pub struct Broadcast {
    key: String,
    handlers: Vec<ChangeHandler>,
}

impl Broadcast {
    /// A broadcast that reaches nobody.
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            handlers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler. Callers must not hold a container lock here.
    pub fn deliver(self) {
        for handler in self.handlers {
            handler(&self.key);
        }
    }
}

impl fmt::Debug for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast")
            .field("key", &self.key)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// The storage contract injected into every reactive container.
pub trait StorageAdapter: Send + Sync {
    /// Raw stored string, `None` when absent or unreadable.
    fn read_raw(&self, key: &str) -> Option<String>;
    /// Persist `value` (`None` removes the key) without notifying anyone yet.
    fn store_raw(&self, key: &str, value: Option<&str>) -> Broadcast;
    /// Register `handler` for writes to `key` made by other views.
    fn subscribe(&self, key: &str, handler: ChangeHandler) -> Subscription;
    /// Whether writes survive a restart.
    fn is_durable(&self) -> bool;

    /// Replace the stored string and notify other views.
    fn write_raw(&self, key: &str, value: &str) {
        self.store_raw(key, Some(value)).deliver();
    }

    /// Remove the key and notify other views.
    fn remove(&self, key: &str) {
        self.store_raw(key, None).deliver();
    }
}

/// Read and decode a JSON value, falling back to `default` when the key is
/// absent, unreadable or does not decode.
pub fn read_json<T: DeserializeOwned>(storage: &dyn StorageAdapter, key: &str, default: T) -> T {
    let Some(raw) = storage.read_raw(key) else {
        return default;
    };
    if raw == "undefined" {
        return default;
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable persisted value");
            default
        }
    }
}

/// Encode `value` as JSON and store it under `key`, leaving the broadcast to
/// the caller.
pub fn store_json<T: Serialize + ?Sized>(
    storage: &dyn StorageAdapter,
    key: &str,
    value: &T,
) -> Broadcast {
    match serde_json::to_string(value) {
        Ok(raw) => storage.store_raw(key, Some(&raw)),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to encode value for storage");
            Broadcast::empty(key)
        }
    }
}

/// Encode `value` as JSON, store it under `key` and notify other views.
pub fn write_json<T: Serialize + ?Sized>(storage: &dyn StorageAdapter, key: &str, value: &T) {
    store_json(storage, key, value).deliver();
}

struct Listener {
    id: u64,
    view: ViewId,
    handler: ChangeHandler,
}

/// Device-level store shared by all views of the same process.
pub struct StorageHub {
    backend: Option<Arc<dyn KvBackend>>,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    next_listener: AtomicU64,
}

impl StorageHub {
    /// Hub over a durable backend.
    pub fn new(backend: Arc<dyn KvBackend>) -> Arc<Self> {
        Arc::new(Self {
            backend: Some(backend),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        })
    }

    /// Hub over a fresh [`MemoryKvStore`].
    pub fn in_memory() -> Arc<Self> {
        Self::new(Arc::new(MemoryKvStore::new()))
    }

    /// Hub with no backing store: reads yield defaults, writes are dropped and
    /// nobody is ever notified.
    pub fn headless() -> Arc<Self> {
        Arc::new(Self {
            backend: None,
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        })
    }

    pub fn is_durable(&self) -> bool {
        self.backend.is_some()
    }

    /// Open a new view with a fresh identity.
    pub fn open_view(self: &Arc<Self>) -> ViewStorage {
        ViewStorage {
            hub: Arc::clone(self),
            view: ViewId::new(),
        }
    }

    /// Number of listeners currently registered for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.listeners.lock().get(key).map_or(0, Vec::len)
    }

    fn read(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read persisted value");
                None
            }
        }
    }

    fn write(&self, origin: ViewId, key: &str, value: Option<&str>) -> Broadcast {
        let Some(backend) = self.backend.as_ref() else {
            return Broadcast::empty(key);
        };
        let result = match value {
            Some(value) => backend.set(key, value),
            None => backend.delete(key),
        };
        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Failed to persist value");
            return Broadcast::empty(key);
        }
        self.broadcast(origin, key)
    }

    /// Handlers of every other view watching `key`.
    fn broadcast(&self, origin: ViewId, key: &str) -> Broadcast {
        let handlers: Vec<ChangeHandler> = self
            .listeners
            .lock()
            .get(key)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.view != origin)
                    .map(|listener| Arc::clone(&listener.handler))
                    .collect()
            })
            .unwrap_or_default();

        if !handlers.is_empty() {
            tracing::debug!(key = %key, view = %origin, count = handlers.len(), "Broadcasting external change");
        }
        Broadcast {
            key: key.to_string(),
            handlers,
        }
    }

    fn add_listener(self: &Arc<Self>, view: ViewId, key: &str, handler: ChangeHandler) -> Subscription {
        if self.backend.is_none() {
            return Subscription::inert();
        }
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(Listener { id, view, handler });

        let hub: Weak<Self> = Arc::downgrade(self);
        let key = key.to_string();
        Subscription::new(move || {
            if let Some(hub) = hub.upgrade() {
                hub.remove_listener(&key, id);
            }
        })
    }

    fn remove_listener(&self, key: &str, id: u64) {
        let mut listeners = self.listeners.lock();
        if let Some(entries) = listeners.get_mut(key) {
            entries.retain(|listener| listener.id != id);
            if entries.is_empty() {
                listeners.remove(key);
            }
        }
    }
}

impl fmt::Debug for StorageHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageHub")
            .field("durable", &self.is_durable())
            .field("watched_keys", &self.listeners.lock().len())
            .finish()
    }
}

/// One view's handle on a [`StorageHub`].
#[derive(Clone)]
pub struct ViewStorage {
    hub: Arc<StorageHub>,
    view: ViewId,
}

impl ViewStorage {
    pub fn view_id(&self) -> ViewId {
        self.view
    }

    pub fn hub(&self) -> &Arc<StorageHub> {
        &self.hub
    }
}

impl StorageAdapter for ViewStorage {
    fn read_raw(&self, key: &str) -> Option<String> {
        self.hub.read(key)
    }

    fn store_raw(&self, key: &str, value: Option<&str>) -> Broadcast {
        self.hub.write(self.view, key, value)
    }

    fn subscribe(&self, key: &str, handler: ChangeHandler) -> Subscription {
        self.hub.add_listener(self.view, key, handler)
    }

    fn is_durable(&self) -> bool {
        self.hub.is_durable()
    }
}

impl fmt::Debug for ViewStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStorage")
            .field("view", &self.view)
            .field("durable", &self.hub.is_durable())
            .finish()
    }
}
