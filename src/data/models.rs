//! Data models for repositories, branches and branch operations
//!
//! Field names follow the backend's camelCase JSON. Operation inputs carry
//! `validator` rules that are checked before any backend call.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::util::{is_valid_date, now_iso, parse_date};

/// The last commit on a branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    #[serde(alias = "hash")]
    pub sha: String,
    #[serde(default)]
    pub short_sha: String,
    /// Commit date as reported by git; normalized to a parseable timestamp
    #[serde(default)]
    pub date: String,
    pub message: String,
    pub author: String,
    pub email: String,
}

impl Commit {
    /// Replace a missing or unparseable date with the current time and fill
    /// in the short SHA when the backend omitted it.
    pub fn normalize(&mut self) {
        if !is_valid_date(&self.date) {
            self.date = now_iso();
        }
        if self.short_sha.is_empty() {
            self.short_sha = self.sha.chars().take(7).collect();
        }
    }
}

/// A local branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    pub current: bool,
    pub last_commit: Commit,
    pub fully_merged: bool,
    /// When the branch was deleted through this application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    /// Whether the tip commit of a deleted branch can still be reached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reachable: Option<bool>,
}

impl Branch {
    /// Minimal identity used by delete requests
    pub fn as_simple(&self) -> SimpleBranch {
        SimpleBranch {
            name: self.name.clone(),
            current: self.current,
        }
    }
}

/// Repository details as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub path: String,
    pub current_branch: String,
    pub branches: Vec<Branch>,
    /// Derived from `branches`; whatever the backend sends is overwritten
    #[serde(default)]
    pub branches_count: usize,
}

impl Repository {
    /// Normalize every commit date and recompute `branches_count`.
    pub fn normalize(mut self) -> Self {
        for branch in &mut self.branches {
            branch.last_commit.normalize();
        }
        self.branches_count = self.branches.len();
        self
    }

    pub fn current(&self) -> Option<&Branch> {
        self.branches.iter().find(|branch| branch.current)
    }

    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|branch| branch.name == name)
    }
}

/// One entry of the persisted repository list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub branches_count: usize,
}

impl RepositoryEntry {
    /// Entry for a repository root; the name is the last path component.
    pub fn from_root(id: impl Into<String>, root_path: impl Into<String>) -> Self {
        let path = root_path.into();
        Self {
            id: id.into(),
            name: repository_name(&path),
            path,
            branches_count: 0,
        }
    }
}

impl From<&Repository> for RepositoryEntry {
    fn from(repo: &Repository) -> Self {
        Self {
            id: repo.id.clone(),
            name: repo.name.clone(),
            path: repo.path.clone(),
            branches_count: repo.branches_count,
        }
    }
}

/// Last non-empty component of a `/` or `\` separated path
pub fn repository_name(path: &str) -> String {
    path.split(['/', '\\'])
        .rev()
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}

/// Backend response for a deleted branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletedBranchInfo {
    pub branch: Branch,
    pub raw_output: String,
}

/// What to do when a restored branch name is already taken
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConflictResolution {
    Overwrite,
    Rename,
    Skip,
}

/// A branch to bring back from its tip commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBranchInfo {
    #[validate(length(min = 1, message = "Original branch name is required"))]
    pub original_name: String,
    #[validate(length(min = 1, message = "Target branch name is required"))]
    pub target_name: String,
    #[validate(length(min = 1, message = "Commit SHA is required"))]
    pub commit_sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_resolution: Option<ConflictResolution>,
}

impl RestoreBranchInfo {
    /// Restore `branch` under its own name
    pub fn for_branch(branch: &Branch) -> Self {
        Self {
            original_name: branch.name.clone(),
            target_name: branch.name.clone(),
            commit_sha: branch.last_commit.sha.clone(),
            conflict_resolution: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetails {
    #[serde(default, alias = "original_name")]
    pub original_name: Option<String>,
    #[serde(default, alias = "conflicting_name")]
    pub conflicting_name: Option<String>,
}

/// Backend response for one restore attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBranchResult {
    pub success: bool,
    #[serde(alias = "branch_name")]
    pub branch_name: String,
    pub message: String,
    #[serde(alias = "requires_user_action")]
    pub requires_user_action: bool,
    pub skipped: bool,
    #[serde(default, alias = "conflict_details")]
    pub conflict_details: Option<ConflictDetails>,
    #[serde(default)]
    pub branch: Option<Branch>,
    #[serde(default)]
    pub processing: Option<bool>,
}

/// Backend response for `is_commit_reachable`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitReachability {
    #[serde(alias = "isReachable")]
    pub is_reachable: bool,
}

/// Backend response for `get_root`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootPathResponse {
    #[serde(alias = "rootPath")]
    pub root_path: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Persisted log of branches deleted in one repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeletedBranchesState {
    pub branches: Vec<Branch>,
}

impl DeletedBranchesState {
    /// Record `branch` as deleted now, replacing any earlier record of it.
    pub fn add(&mut self, mut branch: Branch) {
        branch.deleted_at = Some(now_iso());
        branch.is_reachable = Some(true);
        self.branches.retain(|existing| existing.name != branch.name);
        self.branches.push(branch);
        self.sort_newest_first();
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.branches.len();
        self.branches.retain(|branch| branch.name != name);
        self.branches.len() != before
    }

    pub fn set_reachable(&mut self, name: &str, reachable: bool) -> bool {
        match self.branches.iter_mut().find(|branch| branch.name == name) {
            Some(branch) if branch.is_reachable != Some(reachable) => {
                branch.is_reachable = Some(reachable);
                true
            }
            _ => false,
        }
    }

    fn sort_newest_first(&mut self) {
        self.branches.sort_by(|a, b| {
            let a = a.deleted_at.as_deref().and_then(parse_date);
            let b = b.deleted_at.as_deref().and_then(parse_date);
            b.cmp(&a)
        });
    }
}

/// Tone of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Success,
    Danger,
    Warning,
    #[default]
    Default,
}

/// A message shown to the user, persisted so every view lists it
///
/// Every field is optional on the wire. [`Notification::stamped`] fills in
/// the ones the caller left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    /// Creation time in milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Fill a missing id (uuid v4), feedback (`default`) and date (now).
    /// Fields the caller set are kept.
    pub fn stamped(mut self) -> Self {
        self.id.get_or_insert_with(|| uuid::Uuid::new_v4().to_string());
        self.feedback.get_or_insert(Feedback::Default);
        self.date
            .get_or_insert_with(|| chrono::Utc::now().timestamp_millis());
        self
    }
}

// ============================================================
// Operation inputs
// ============================================================

/// Branch identity sent with delete requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SimpleBranch {
    #[validate(length(min = 1, message = "Branch name is required"))]
    pub name: String,
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GetRepositoryInput {
    #[validate(length(min = 1, message = "Repository path is required"))]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RootPathInput {
    #[validate(length(min = 1, message = "Path is required"))]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct DeleteBranchesInput {
    #[validate(length(min = 1, message = "Repository path is required"))]
    pub path: String,
    #[validate(nested)]
    pub branches: Vec<SimpleBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBranchInput {
    #[validate(length(min = 1, message = "Repository path is required"))]
    pub path: String,
    #[validate(nested)]
    pub branch_info: RestoreBranchInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBranchesInput {
    #[validate(length(min = 1, message = "Repository path is required"))]
    pub path: String,
    #[validate(length(min = 1, message = "At least one branch is required"), nested)]
    pub branch_infos: Vec<RestoreBranchInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IsCommitReachableInput {
    #[validate(length(min = 1, message = "Repository path is required"))]
    pub path: String,
    #[validate(length(min = 1, message = "Commit SHA is required"))]
    pub commit_sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SwitchBranchInput {
    #[validate(length(min = 1, message = "Repository path is required"))]
    pub path: String,
    #[validate(length(min = 1, message = "Branch name is required"))]
    pub branch: String,
}
