//! Per-repository log of branches deleted through the application.

use std::sync::Arc;

use super::container::Container;
use super::storage::{StorageAdapter, Subscription};
use crate::data::{Branch, DeletedBranchesState};

/// Deleted branches of one repository, newest first.
#[derive(Debug, Clone)]
pub struct DeletedBranches {
    inner: Container<DeletedBranchesState>,
}

impl DeletedBranches {
    pub fn new(storage: Arc<dyn StorageAdapter>, key: impl Into<String>) -> Self {
        Self {
            inner: Container::new(storage, key, DeletedBranchesState::default()),
        }
    }

    /// Record a freshly deleted branch. It is stamped with the deletion time and
    /// assumed reachable until checked.
    pub fn add_deleted_branch(&self, branch: Branch) {
        self.inner.update(|state| {
            let mut next = state.clone();
            next.add(branch);
            next
        });
    }

    /// Forget a branch, typically after it was restored.
    pub fn remove_deleted_branch(&self, name: &str) {
        if !self.contains(name) {
            return;
        }
        self.inner.update(|state| {
            let mut next = state.clone();
            next.remove(name);
            next
        });
    }

    /// Record whether the branch's tip commit is still reachable. Unknown
    /// names are ignored.
    pub fn update_branch_reachability(&self, name: &str, reachable: bool) {
        let changes = self.inner.with(|state| {
            state
                .branches
                .iter()
                .any(|branch| branch.name == name && branch.is_reachable != Some(reachable))
        });
        if !changes {
            return;
        }
        self.inner.update(|state| {
            let mut next = state.clone();
            next.set_reachable(name, reachable);
            next
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .with(|state| state.branches.iter().any(|branch| branch.name == name))
    }

    pub fn find(&self, name: &str) -> Option<Branch> {
        self.inner.with(|state| {
            state
                .branches
                .iter()
                .find(|branch| branch.name == name)
                .cloned()
        })
    }

    pub fn list(&self) -> Vec<Branch> {
        self.inner.with(|state| state.branches.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.with(|state| state.branches.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.set(DeletedBranchesState::default());
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&DeletedBranchesState) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(observer)
    }
}
