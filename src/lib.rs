//! Branch selection, locking and search state for a git branch manager.
//!
//! [`store`] holds the reactive containers persisted per repository and shared
//! between views; [`core`] runs repository and branch operations against a
//! [`Backend`].

pub mod backend;
pub mod config;
pub mod core;
pub mod data;
pub mod store;
pub mod util;

pub use backend::{Backend, BackendFailure, Command, MockBackend};
pub use config::Config;
pub use crate::core::{
    AppError, BranchDeckCore, BranchService, ErrorKind, QueryCache, QueryKey, RepositoryService,
};
pub use data::{Branch, Commit, Database, Repository, RepositoryEntry};
pub use store::{
    Container, SearchFilter, SetContainer, StorageAdapter, StorageHub, StoreRegistry, Stores,
};
