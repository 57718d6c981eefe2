//! Query keys and the cache of query results.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Ordered tuple identifying a cached query or a mutation.
///
/// The first part is a domain tag (`branches`, `commit`, `repository`), the
/// rest are operation-specific discriminators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Repository details fetched by path.
    pub fn repository(path: &str) -> Self {
        Self::new(["branches", "get-all", path])
    }

    pub fn commit_reachable(commit_sha: &str) -> Self {
        Self::new(["commit", "is_reachable", commit_sha])
    }

    pub fn root_path(path: &str) -> Self {
        Self::new(["repository", "root-path", path])
    }

    pub fn delete_branches() -> Self {
        Self::new(["branches", "delete"])
    }

    pub fn restore_branch() -> Self {
        Self::new(["branches", "restore"])
    }

    pub fn restore_branches() -> Self {
        Self::new(["branches", "restore-batch"])
    }

    pub fn switch_branch() -> Self {
        Self::new(["switch-branch"])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` matches the leading parts of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The key without empty parts.
    pub fn compact(&self) -> Self {
        Self(self.0.iter().filter(|part| !part.is_empty()).cloned().collect())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: DateTime<Utc>,
}

/// Query results keyed by [`QueryKey`]. Entries live until invalidated.
///
/// The cache also counts mutations in flight, so a view can tell that a
/// delete or restore is still running.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    mutations: Mutex<HashMap<QueryKey, usize>>,
}

/// Marks one running mutation until dropped.
#[must_use = "the mutation counts as finished once the guard is dropped"]
#[derive(Debug)]
pub struct MutationGuard<'a> {
    cache: &'a QueryCache,
    key: QueryKey,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        let mut mutations = self.cache.mutations.lock();
        if let Some(count) = mutations.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                mutations.remove(&self.key);
            }
        }
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `key`, if it decodes as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.entries.lock().get(key)?.value.clone();
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                self.entries.lock().remove(key);
                None
            }
        }
    }

    pub fn insert<T: Serialize + ?Sized>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.lock().insert(
                    key,
                    CacheEntry {
                        value,
                        fetched_at: Utc::now(),
                    },
                );
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to cache query result"),
        }
    }

    /// When `key` was last stored.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.entries.lock().get(key).map(|entry| entry.fetched_at)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Drop every entry whose key starts with `prefix` (empty parts ignored).
    /// Returns how many entries were dropped.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let prefix = prefix.compact();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - entries.len();
        tracing::debug!(prefix = %prefix, removed, "Invalidated queries");
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Count a mutation under `key` as running until the guard drops.
    pub fn begin_mutation(&self, key: QueryKey) -> MutationGuard<'_> {
        *self.mutations.lock().entry(key.clone()).or_insert(0) += 1;
        MutationGuard { cache: self, key }
    }

    /// Running mutations whose key starts with `prefix`.
    pub fn mutations_in_flight(&self, prefix: &QueryKey) -> usize {
        self.mutations
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
