//! The per-view set of application stores.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::container::Container;
use super::deleted::DeletedBranches;
use super::notifications::Notifications;
use super::registry::{StoreKey, StoreRegistry};
use super::repositories::RepositoryList;
use super::search::{SearchFilter, DEFAULT_SEARCH_DEBOUNCE};
use super::set::SetContainer;
use super::storage::StorageAdapter;

/// Registry name of the selected-branches sets.
pub const SELECTED: &str = "selected";
/// Registry name of the locked-branches sets.
pub const LOCKED: &str = "locked";
/// Registry name of the branch search filters.
pub const SEARCH: &str = "search";
/// Registry name of the deleted-branch logs.
pub const DELETED_BRANCHES: &str = "deleted_branches";
/// Registry name of the last successful fetch timestamps.
pub const LAST_FETCHED: &str = "last_fetched";

const PER_REPOSITORY: &[&str] = &[SELECTED, LOCKED, SEARCH, DELETED_BRANCHES, LAST_FETCHED];

/// When a repository was last fetched successfully.
pub type LastFetched = Container<Option<DateTime<Utc>>>;

/// Every store one view works with, sharing one storage adapter.
///
/// Per-repository accessors return `None` until a repository is chosen, so
/// callers may invoke them unconditionally.
pub struct Stores {
    storage: Arc<dyn StorageAdapter>,
    registry: StoreRegistry,
    repositories: RepositoryList,
    notifications: Notifications,
    search_debounce: Duration,
}

impl Stores {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self::with_search_debounce(storage, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_search_debounce(storage: Arc<dyn StorageAdapter>, search_debounce: Duration) -> Self {
        Self {
            repositories: RepositoryList::new(Arc::clone(&storage)),
            notifications: Notifications::new(Arc::clone(&storage)),
            storage,
            registry: StoreRegistry::new(),
            search_debounce,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn repositories(&self) -> &RepositoryList {
        &self.repositories
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Branch names selected in `repository`.
    pub fn selected(&self, repository: Option<&str>) -> Option<Arc<SetContainer>> {
        self.registry.get_or_create(SELECTED, repository, |key| {
            SetContainer::new(Arc::clone(&self.storage), key.storage_key())
        })
    }

    /// Branch names protected from deletion in `repository`.
    pub fn locked(&self, repository: Option<&str>) -> Option<Arc<SetContainer>> {
        self.registry.get_or_create(LOCKED, repository, |key| {
            SetContainer::new(Arc::clone(&self.storage), key.storage_key())
        })
    }

    pub fn search(&self, repository: Option<&str>) -> Option<Arc<SearchFilter>> {
        self.registry.get_or_create(SEARCH, repository, |key| {
            SearchFilter::new(
                Arc::clone(&self.storage),
                key.storage_key(),
                self.search_debounce,
            )
        })
    }

    pub fn deleted_branches(&self, repository: Option<&str>) -> Option<Arc<DeletedBranches>> {
        self.registry.get_or_create(DELETED_BRANCHES, repository, |key| {
            DeletedBranches::new(Arc::clone(&self.storage), key.storage_key())
        })
    }

    pub fn last_fetched(&self, repository: Option<&str>) -> Option<Arc<LastFetched>> {
        self.registry.get_or_create(LAST_FETCHED, repository, |key| {
            Container::new(Arc::clone(&self.storage), key.storage_key(), None)
        })
    }

    /// Drop all per-repository state of `repository`: live containers are
    /// reset (so their observers see it), persisted values are removed and
    /// the registry entries are evicted.
    pub fn forget_repository(&self, repository: &str) {
        if repository.is_empty() {
            return;
        }
        if let Some(set) = self.registry.get::<SetContainer>(SELECTED, repository) {
            set.clear();
        }
        if let Some(set) = self.registry.get::<SetContainer>(LOCKED, repository) {
            set.clear();
        }
        if let Some(search) = self.registry.get::<SearchFilter>(SEARCH, repository) {
            search.clear();
        }
        if let Some(deleted) = self.registry.get::<DeletedBranches>(DELETED_BRANCHES, repository) {
            deleted.clear();
        }
        if let Some(fetched) = self.registry.get::<LastFetched>(LAST_FETCHED, repository) {
            fetched.set(None);
        }

        for registry in PER_REPOSITORY {
            self.storage
                .remove(&StoreKey::new(*registry, repository).storage_key());
        }
        let evicted = self.registry.remove_repository(repository);
        tracing::debug!(repository = %repository, evicted, "Forgot repository state");
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("registry", &self.registry)
            .field("repositories", &self.repositories.len())
            .field("notifications", &self.notifications.len())
            .field("search_debounce", &self.search_debounce)
            .finish()
    }
}
