//! Backend payloads and core constructors for tests

use std::path::PathBuf;
use std::sync::Arc;

use branchdeck::{BranchDeckCore, Config, MockBackend, StorageHub};
use serde_json::{json, Value};
use tempfile::TempDir;

pub fn commit_json(sha: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "shortSha": &sha[..sha.len().min(7)],
        "date": date,
        "message": "work in progress",
        "author": "Test User",
        "email": "test@example.com"
    })
}

pub fn branch_json(name: &str, current: bool) -> Value {
    json!({
        "name": name,
        "current": current,
        "fullyMerged": !current,
        "lastCommit": commit_json(&format!("{name}-0123456789"), "2024-03-01T10:00:00Z")
    })
}

/// `get_repo_info` payload; the first branch is the current one.
pub fn repository_json(id: &str, path: &str, branches: &[&str]) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    json!({
        "id": id,
        "name": name,
        "path": path,
        "currentBranch": branches.first().copied().unwrap_or_default(),
        "branches": branches
            .iter()
            .enumerate()
            .map(|(i, branch)| branch_json(branch, i == 0))
            .collect::<Vec<_>>()
    })
}

/// Core on a fresh in-memory hub.
pub fn memory_core(backend: &MockBackend) -> BranchDeckCore {
    BranchDeckCore::with_hub(
        Config::ephemeral(),
        StorageHub::in_memory(),
        Arc::new(backend.clone()),
    )
}

/// A SQLite database in a temporary directory.
pub struct TempStore {
    _dir: TempDir,
    pub database: PathBuf,
}

impl TempStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let database = dir.path().join("branchdeck.db");
        Self {
            _dir: dir,
            database,
        }
    }

    pub fn config(&self) -> Config {
        Config::default().with_database(self.database.clone())
    }

    /// Open a core on the database, as a fresh application start would.
    pub fn open(&self, backend: &MockBackend) -> BranchDeckCore {
        BranchDeckCore::new(self.config(), Arc::new(backend.clone()))
    }
}
