//! Persisted list of known repositories.

use std::sync::Arc;

use super::container::Container;
use super::storage::{StorageAdapter, Subscription};
use crate::data::RepositoryEntry;

/// Storage key of the repository list.
pub const REPOSITORIES_KEY: &str = "repositories";

/// Known repositories, kept sorted by name.
#[derive(Debug, Clone)]
pub struct RepositoryList {
    inner: Container<Vec<RepositoryEntry>>,
}

impl RepositoryList {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner: Container::new(storage, REPOSITORIES_KEY, Vec::new()),
        }
    }

    /// Add `entry` unless a repository with the same path is already known.
    /// Returns the entry that ends up in the list.
    pub fn register(&self, entry: RepositoryEntry) -> RepositoryEntry {
        if let Some(existing) = self.find_by_path(&entry.path) {
            return existing;
        }
        tracing::debug!(id = %entry.id, path = %entry.path, "Registering repository");
        self.upsert(entry.clone());
        entry
    }

    /// Replace the entry with the same id, or insert it.
    pub fn upsert(&self, entry: RepositoryEntry) {
        self.inner.update(|entries| {
            let mut next: Vec<RepositoryEntry> = entries
                .iter()
                .filter(|existing| existing.id != entry.id)
                .cloned()
                .collect();
            next.push(entry);
            next.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
            next
        });
    }

    pub fn remove(&self, id: &str) -> Option<RepositoryEntry> {
        let removed = self.find_by_id(id)?;
        self.inner.update(|entries| {
            entries
                .iter()
                .filter(|entry| entry.id != id)
                .cloned()
                .collect()
        });
        Some(removed)
    }

    pub fn clear(&self) {
        self.inner.set(Vec::new());
    }

    pub fn find_by_path(&self, path: &str) -> Option<RepositoryEntry> {
        self.inner
            .with(|entries| entries.iter().find(|entry| entry.path == path).cloned())
    }

    pub fn find_by_id(&self, id: &str) -> Option<RepositoryEntry> {
        self.inner
            .with(|entries| entries.iter().find(|entry| entry.id == id).cloned())
    }

    /// Look a repository up by id, falling back to its path.
    pub fn resolve(&self, id_or_path: &str) -> Option<RepositoryEntry> {
        self.find_by_id(id_or_path)
            .or_else(|| self.find_by_path(id_or_path))
    }

    pub fn first(&self) -> Option<RepositoryEntry> {
        self.inner.with(|entries| entries.first().cloned())
    }

    /// Record the branch count of the repository at `path`. Returns whether
    /// anything changed.
    pub fn set_branches_count(&self, path: &str, count: usize) -> bool {
        let changes = self.inner.with(|entries| {
            entries
                .iter()
                .any(|entry| entry.path == path && entry.branches_count != count)
        });
        if !changes {
            return false;
        }
        self.inner.update(|entries| {
            entries
                .iter()
                .cloned()
                .map(|mut entry| {
                    if entry.path == path {
                        entry.branches_count = count;
                    }
                    entry
                })
                .collect()
        });
        true
    }

    pub fn list(&self) -> Vec<RepositoryEntry> {
        self.inner.get()
    }

    pub fn len(&self) -> usize {
        self.inner.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.with(Vec::is_empty)
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&Vec<RepositoryEntry>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(observer)
    }
}
