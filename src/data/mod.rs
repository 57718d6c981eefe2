//! Data layer for BranchDeck
//!
//! This module provides the SQLite key-value table behind the persisted stores
//! and the models exchanged with the backend.

mod database;
mod kv_store;
mod migrations;
mod models;

pub use database::{Database, DatabaseError};
pub use kv_store::SqliteKvStore;
pub use models::{
    repository_name, Branch, Commit, CommitReachability, ConflictDetails, ConflictResolution,
    DeleteBranchesInput, DeletedBranchInfo, DeletedBranchesState, Feedback, GetRepositoryInput,
    IsCommitReachableInput, Notification, Repository, RepositoryEntry, RestoreBranchInfo,
    RestoreBranchInput, RestoreBranchResult, RestoreBranchesInput, RootPathInput,
    RootPathResponse, SimpleBranch, SwitchBranchInput,
};
