//! Core module containing the query and mutation layer.
//!
//! - [`BranchDeckCore`] ties a view's stores to storage and the backend
//! - [`query`] holds query keys and the result cache
//! - [`services`] runs the operations, validating inputs and mapping failures

mod branchdeck_core;
pub mod query;
pub mod services;

pub use branchdeck_core::BranchDeckCore;
pub use query::{MutationGuard, QueryCache, QueryKey};
pub use services::{AppError, BranchService, ErrorKind, RepositoryService};
