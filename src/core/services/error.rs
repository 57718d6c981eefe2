//! The error shape every orchestration operation returns.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendFailure;

/// Error categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input or response did not match its schema
    ValidationError,
    /// A repository path was required but absent
    MissingPath,
    /// A branch operation was requested with no branches
    MissingBranches,
    /// The backend reported a failure
    TauriError,
    Unknown,
}

impl ErrorKind {
    /// Wire tag of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::MissingPath => "missing_path",
            ErrorKind::MissingBranches => "missing_branches",
            ErrorKind::TauriError => "tauri_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether the caller can fix the problem by changing its input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ValidationError | ErrorKind::MissingPath | ErrorKind::MissingBranches
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized failure of a query or mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub message: String,
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validation(message: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message).with_description(description)
    }

    pub fn missing_path(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingPath, "No path provided").with_description(description)
    }

    pub fn missing_branches() -> Self {
        Self::new(ErrorKind::MissingBranches, "No branches selected")
            .with_description("Please select at least one branch")
    }

    /// Wrap a backend failure, keeping its message and description when
    /// present.
    pub fn from_backend(failure: BackendFailure, fallback: &str) -> Self {
        let message = if failure.message.trim().is_empty() {
            fallback.to_string()
        } else {
            failure.message
        };
        Self {
            message,
            kind: ErrorKind::TauriError,
            description: failure.description.filter(|d| !d.is_empty()),
        }
    }

    /// The backend answered with something that is not JSON.
    pub fn malformed_response(detail: impl fmt::Display) -> Self {
        Self::new(ErrorKind::TauriError, "Malformed backend response")
            .with_description(detail.to_string())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}
