use serde_json::json;

use super::command::{invoke, invoke_raw};
use super::error::AppError;
use super::validation::validate_input;
use crate::backend::Command;
use crate::core::query::QueryKey;
use crate::core::BranchDeckCore;
use crate::data::{
    CommitReachability, DeleteBranchesInput, DeletedBranchInfo, IsCommitReachableInput,
    RestoreBranchInput, RestoreBranchResult, RestoreBranchesInput, SwitchBranchInput,
};

/// Per-branch outcome of a batch restore, keyed by branch name.
pub type RestoreBatchResult = Vec<(String, RestoreBranchResult)>;

pub struct BranchService;

impl BranchService {
    /// Whether `commit_sha` is still reachable in the repository at `path`.
    ///
    /// Inert (returns `Ok(None)`) while either input is empty. Results are
    /// cached per commit SHA.
    pub async fn is_commit_reachable(
        core: &BranchDeckCore,
        input: &IsCommitReachableInput,
    ) -> Result<Option<bool>, AppError> {
        if input.path.is_empty() || input.commit_sha.is_empty() {
            return Ok(None);
        }
        let key = QueryKey::commit_reachable(&input.commit_sha);
        if let Some(cached) = core.cache().get::<bool>(&key) {
            return Ok(Some(cached));
        }
        validate_input(input, "Invalid input data for reachability check")?;

        let response: CommitReachability = invoke(
            core,
            Command::IsCommitReachable,
            input,
            "Failed to check commit reachability",
            "Invalid reachability response",
        )
        .await?;
        core.cache().insert(key, &response.is_reachable);
        Ok(Some(response.is_reachable))
    }

    /// Re-check every deleted branch of `repository` and record the result
    /// in its deleted-branch log. Returns how many branches were checked.
    pub async fn refresh_deleted_reachability(
        core: &BranchDeckCore,
        repository: &str,
        path: &str,
    ) -> Result<usize, AppError> {
        let Some(deleted) = core.stores().deleted_branches(Some(repository)) else {
            return Ok(0);
        };
        let branches = deleted.list();
        for branch in &branches {
            let input = IsCommitReachableInput {
                path: path.to_string(),
                commit_sha: branch.last_commit.sha.clone(),
            };
            if let Some(reachable) = Self::is_commit_reachable(core, &input).await? {
                deleted.update_branch_reachability(&branch.name, reachable);
            }
        }
        Ok(branches.len())
    }

    /// Delete branches.
    ///
    /// Selection and lock state are left alone: callers update them after a
    /// successful delete. The repository query for `path` is invalidated.
    pub async fn delete_branches(
        core: &BranchDeckCore,
        input: &DeleteBranchesInput,
    ) -> Result<Vec<DeletedBranchInfo>, AppError> {
        validate_input(input, "Invalid input data for deleting branches")?;
        if input.branches.is_empty() {
            return Err(AppError::missing_branches());
        }

        let _mutation = core.cache().begin_mutation(QueryKey::delete_branches());
        let names: Vec<&str> = input.branches.iter().map(|b| b.name.as_str()).collect();
        let deleted: Vec<DeletedBranchInfo> = invoke(
            core,
            Command::DeleteBranches,
            &json!({ "path": input.path, "branches": names }),
            "Failed to delete branches",
            "Invalid delete branches response",
        )
        .await?;

        core.cache().invalidate(&QueryKey::repository(&input.path));
        tracing::debug!(path = %input.path, count = deleted.len(), "Deleted branches");
        Ok(deleted)
    }

    /// Add freshly deleted branches to the deleted-branch log of `repository`.
    pub fn record_deleted(core: &BranchDeckCore, repository: &str, deleted: &[DeletedBranchInfo]) {
        if let Some(log) = core.stores().deleted_branches(Some(repository)) {
            for info in deleted {
                log.add_deleted_branch(info.branch.clone());
            }
        }
    }

    pub async fn restore_deleted_branch(
        core: &BranchDeckCore,
        input: &RestoreBranchInput,
    ) -> Result<RestoreBranchResult, AppError> {
        validate_input(input, "Invalid input data for restoring branch")?;
        let _mutation = core.cache().begin_mutation(QueryKey::restore_branch());

        let result: RestoreBranchResult = invoke(
            core,
            Command::RestoreDeletedBranch,
            input,
            "Failed to restore branch",
            "Invalid restore branch response",
        )
        .await?;

        if result.success {
            core.cache().invalidate(&QueryKey::repository(&input.path));
        }
        Ok(result)
    }

    pub async fn restore_deleted_branches(
        core: &BranchDeckCore,
        input: &RestoreBranchesInput,
    ) -> Result<RestoreBatchResult, AppError> {
        validate_input(input, "Invalid input data for batch restoring branches")?;
        let _mutation = core.cache().begin_mutation(QueryKey::restore_branches());

        let results: RestoreBatchResult = invoke(
            core,
            Command::RestoreDeletedBranches,
            input,
            "Failed to restore branches",
            "Invalid restore branches response",
        )
        .await?;

        if results.iter().any(|(_, result)| result.success) {
            core.cache().invalidate(&QueryKey::repository(&input.path));
        }
        Ok(results)
    }

    /// Drop successfully restored branches from the deleted-branch log of
    /// `repository`.
    pub fn record_restored(core: &BranchDeckCore, repository: &str, results: &[RestoreBranchResult]) {
        if let Some(log) = core.stores().deleted_branches(Some(repository)) {
            for result in results.iter().filter(|result| result.success) {
                log.remove_deleted_branch(&result.branch_name);
            }
        }
    }

    /// Check out `input.branch`. Returns the backend's message.
    pub async fn switch_branch(
        core: &BranchDeckCore,
        input: &SwitchBranchInput,
    ) -> Result<String, AppError> {
        if input.path.is_empty() {
            return Err(AppError::missing_path(
                "A repository path is required to switch branches",
            ));
        }
        validate_input(input, "Invalid input data")?;
        let _mutation = core.cache().begin_mutation(QueryKey::switch_branch());

        let message =
            invoke_raw(core, Command::SwitchBranch, input, "Failed to switch branch").await?;
        core.cache().invalidate(&QueryKey::repository(&input.path));
        Ok(message)
    }
}
