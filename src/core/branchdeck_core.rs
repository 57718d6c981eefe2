//! Core infrastructure shared by every view.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::Config;
use crate::data::Database;
use crate::store::{StorageHub, Stores};

use super::query::QueryCache;

/// Everything one view needs to run queries and mutations.
///
/// This struct owns:
/// - The storage hub and this view's stores
/// - The query cache
/// - The backend the operations are sent to
pub struct BranchDeckCore {
    /// Application configuration
    config: Config,
    /// Database connection (owned to keep connection alive)
    database: Option<Database>,
    /// Device-level persisted store
    hub: Arc<StorageHub>,
    /// Stores of this view
    stores: Stores,
    /// Cached query results
    cache: QueryCache,
    /// Backend command interface
    backend: Arc<dyn Backend>,
}

impl BranchDeckCore {
    /// Open the configured storage and create the first view.
    ///
    /// When the database cannot be opened, or durable storage is disabled,
    /// the core runs on a headless hub: nothing is persisted.
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let (database, hub) = if config.storage.durable {
            match Database::open(config.storage.database.clone()) {
                Ok(db) => {
                    let hub = StorageHub::new(Arc::new(db.kv_store()));
                    (Some(db), hub)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to open database, state will not persist");
                    (None, StorageHub::headless())
                }
            }
        } else {
            (None, StorageHub::headless())
        };

        let mut core = Self::with_hub(config, hub, backend);
        core.database = database;
        core
    }

    /// Create a view on an existing hub.
    pub fn with_hub(config: Config, hub: Arc<StorageHub>, backend: Arc<dyn Backend>) -> Self {
        let storage = Arc::new(hub.open_view());
        let stores = Stores::with_search_debounce(storage, config.search.debounce);
        Self {
            config,
            database: None,
            hub,
            stores,
            cache: QueryCache::new(),
            backend,
        }
    }

    /// Another view on the same hub and backend, with its own stores and cache.
    pub fn open_view(&self) -> Self {
        let mut view = Self::with_hub(
            self.config.clone(),
            Arc::clone(&self.hub),
            Arc::clone(&self.backend),
        );
        view.database = self.database.clone();
        view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn hub(&self) -> &Arc<StorageHub> {
        &self.hub
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn is_durable(&self) -> bool {
        self.hub.is_durable()
    }
}

impl std::fmt::Debug for BranchDeckCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchDeckCore")
            .field("config", &self.config)
            .field("database", &self.database)
            .field("stores", &self.stores)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use tempfile::tempdir;

    #[test]
    fn test_durable_core_persists_across_instances() {
        let dir = tempdir().unwrap();
        let config = Config::default().with_database(dir.path().join("state.db"));

        let core = BranchDeckCore::new(config.clone(), Arc::new(MockBackend::new()));
        assert!(core.is_durable());
        core.stores().selected(Some("repo")).unwrap().add(["main"]);
        drop(core);

        let core = BranchDeckCore::new(config, Arc::new(MockBackend::new()));
        assert!(core.stores().selected(Some("repo")).unwrap().has("main"));
    }

    #[test]
    fn test_ephemeral_core_is_headless() {
        let core = BranchDeckCore::new(Config::ephemeral(), Arc::new(MockBackend::new()));
        assert!(!core.is_durable());
        assert!(core.database().is_none());
    }

    #[test]
    fn test_views_share_state() {
        let core = BranchDeckCore::with_hub(
            Config::ephemeral(),
            StorageHub::in_memory(),
            Arc::new(MockBackend::new()),
        );
        let other = core.open_view();

        let watched = other.stores().locked(Some("repo")).unwrap();
        core.stores().locked(Some("repo")).unwrap().add(["release"]);
        assert!(watched.has("release"));
        assert!(!Arc::ptr_eq(
            &watched,
            &core.stores().locked(Some("repo")).unwrap()
        ));
    }
}
