//! Query and mutation operations sent to the backend.

mod branch_service;
mod command;
pub mod error;
mod repository_service;
pub mod validation;

pub use branch_service::{BranchService, RestoreBatchResult};
pub use error::{AppError, ErrorKind};
pub use repository_service::RepositoryService;
