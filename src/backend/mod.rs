//! Backend command interface.
//!
//! Every git operation lives behind a single request/response call: a command
//! name plus JSON parameters in, a JSON-encoded string or a tagged failure out.

pub mod mock;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::MockBackend;

/// Commands understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    GetRoot,
    GetRepoInfo,
    SwitchBranch,
    DeleteBranches,
    IsCommitReachable,
    RestoreDeletedBranch,
    RestoreDeletedBranches,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::GetRoot,
        Command::GetRepoInfo,
        Command::SwitchBranch,
        Command::DeleteBranches,
        Command::IsCommitReachable,
        Command::RestoreDeletedBranch,
        Command::RestoreDeletedBranches,
    ];

    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::GetRoot => "get_root",
            Command::GetRepoInfo => "get_repo_info",
            Command::SwitchBranch => "switch_branch",
            Command::DeleteBranches => "delete_branches",
            Command::IsCommitReachable => "is_commit_reachable",
            Command::RestoreDeletedBranch => "restore_deleted_branch",
            Command::RestoreDeletedBranches => "restore_deleted_branches",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the backend itself.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct BackendFailure {
    pub message: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            description: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The native side performing git operations.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run `command` with `args` and return its JSON-encoded payload.
    async fn invoke(
        &self,
        command: Command,
        args: serde_json::Value,
    ) -> Result<String, BackendFailure>;
}
