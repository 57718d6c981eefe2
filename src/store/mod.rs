//! Reactive, persisted client state.
//!
//! Containers hold one value each, persist it through a [`StorageAdapter`] and
//! stay consistent with other views writing the same key. The
//! [`StoreRegistry`] hands out one container per `(registry, repository)`.

mod container;
mod debounce;
mod deleted;
mod notifications;
mod registry;
mod repositories;
mod search;
mod set;
mod storage;
mod stores;

pub use container::{Container, Observer, Persisted};
pub use debounce::Debouncer;
pub use deleted::DeletedBranches;
pub use notifications::{Notifications, NOTIFICATIONS_KEY};
pub use registry::{StoreKey, StoreRegistry};
pub use repositories::{RepositoryList, REPOSITORIES_KEY};
pub use search::{SearchFilter, DEFAULT_SEARCH_DEBOUNCE};
pub use set::SetContainer;
pub use storage::{
    read_json, store_json, write_json, Broadcast, ChangeHandler, KvBackend, MemoryKvStore,
    StorageAdapter, StorageError, StorageHub, Subscription, ViewId, ViewStorage,
};
pub use stores::{LastFetched, Stores, DELETED_BRANCHES, LAST_FETCHED, LOCKED, SEARCH, SELECTED};
