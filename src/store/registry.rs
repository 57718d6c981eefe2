//! Keyed singleton registry for per-repository containers.
//!
//! Every `(registry name, repository)` pair maps to exactly one live instance
//! for as long as the registry lives. Views may ask before a repository has
//! been chosen: an absent or empty repository yields `None`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifies one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub registry: String,
    pub repository: String,
}

impl StoreKey {
    pub fn new(registry: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            repository: repository.into(),
        }
    }

    /// Flat storage key for this entry.
    ///
    /// The registry name is length-prefixed so that no two distinct
    /// `(registry, repository)` pairs produce the same key.
    pub fn storage_key(&self) -> String {
        format!(
            "store:{}:{}:{}",
            self.registry.len(),
            self.registry,
            self.repository
        )
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Process-lifetime map from [`StoreKey`] to one container instance.
#[derive(Default)]
pub struct StoreRegistry {
    entries: Mutex<HashMap<StoreKey, Entry>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the instance registered for `(registry, repository)`, creating it
    /// with `create` on first access.
    ///
    /// Returns `None` when `repository` is absent or empty, or when an instance
    /// of a different type already occupies the key.
    pub fn get_or_create<C, F>(
        &self,
        registry: &str,
        repository: Option<&str>,
        create: F,
    ) -> Option<Arc<C>>
    where
        C: Send + Sync + 'static,
        F: FnOnce(&StoreKey) -> C,
    {
        let repository = repository.filter(|r| !r.is_empty())?;
        let key = StoreKey::new(registry, repository);

        // Creation happens under the lock so two callers can never race to
        // build separate instances for the same key.
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&key) {
            return match Arc::clone(existing).downcast::<C>() {
                Ok(store) => Some(store),
                Err(_) => {
                    tracing::error!(
                        key = %key,
                        expected = std::any::type_name::<C>(),
                        "Registry entry holds a different store type"
                    );
                    None
                }
            };
        }

        tracing::debug!(key = %key, "Creating store");
        let store = Arc::new(create(&key));
        entries.insert(key, Arc::clone(&store) as Entry);
        Some(store)
    }

    /// The live instance for `(registry, repository)`, without creating one.
    pub fn get<C: Send + Sync + 'static>(&self, registry: &str, repository: &str) -> Option<Arc<C>> {
        let entries = self.entries.lock();
        let entry = entries.get(&StoreKey::new(registry, repository))?;
        Arc::clone(entry).downcast::<C>().ok()
    }

    /// Drop every entry belonging to `repository`. Returns how many were removed.
    pub fn remove_repository(&self, repository: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| key.repository != repository);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(repository = %repository, removed, "Evicted repository stores");
        }
        removed
    }

    pub fn contains(&self, registry: &str, repository: &str) -> bool {
        self.entries
            .lock()
            .contains_key(&StoreKey::new(registry, repository))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.entries.lock().keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("StoreRegistry").field("entries", &keys).finish()
    }
}
