use serde_json::json;

use super::command::invoke;
use super::error::AppError;
use super::validation::validate_input;
use crate::backend::Command;
use crate::core::query::QueryKey;
use crate::core::BranchDeckCore;
use crate::data::{
    GetRepositoryInput, Repository, RepositoryEntry, RootPathInput, RootPathResponse,
};

pub struct RepositoryService;

impl RepositoryService {
    /// Repository details for `path`, served from the cache when present.
    ///
    /// Inert while `path` is unset: returns `Ok(None)` without calling the
    /// backend.
    pub async fn query_repository(
        core: &BranchDeckCore,
        path: Option<&str>,
    ) -> Result<Option<Repository>, AppError> {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        if let Some(cached) = core.cache().get::<Repository>(&QueryKey::repository(path)) {
            return Ok(Some(cached));
        }
        Self::fetch_repository(core, path).await.map(Some)
    }

    /// Fetch repository details from the backend.
    ///
    /// Commit dates are normalized and `branches_count` is recomputed. On
    /// success the result is cached, the repository list learns the new
    /// branch count and the repository's last-fetched time is stamped.
    pub async fn fetch_repository(core: &BranchDeckCore, path: &str) -> Result<Repository, AppError> {
        if path.is_empty() {
            return Err(AppError::missing_path(
                "A repository path is required to fetch repository data",
            ));
        }
        let input = GetRepositoryInput {
            path: path.to_string(),
        };
        validate_input(&input, "Invalid input data")?;

        let repository: Repository = invoke(
            core,
            Command::GetRepoInfo,
            &input,
            "Failed to fetch repository data",
            "Invalid repository data",
        )
        .await?;
        let repository = repository.normalize();

        core.cache().insert(QueryKey::repository(path), &repository);

        let repositories = core.stores().repositories();
        repositories.set_branches_count(path, repository.branches_count);
        if repository.path != path {
            repositories.set_branches_count(&repository.path, repository.branches_count);
        }

        let id = repositories
            .find_by_path(path)
            .map(|entry| entry.id)
            .unwrap_or_else(|| repository.id.clone());
        if let Some(last_fetched) = core.stores().last_fetched(Some(&id)) {
            last_fetched.set(Some(chrono::Utc::now()));
        }

        tracing::debug!(
            path = %path,
            branches = repository.branches_count,
            "Fetched repository"
        );
        Ok(repository)
    }

    /// Resolve the repository root containing `path` and register it.
    ///
    /// A root that is already known (same path) is returned as is.
    pub async fn resolve_root_path(
        core: &BranchDeckCore,
        path: &str,
    ) -> Result<RepositoryEntry, AppError> {
        if path.is_empty() {
            return Err(AppError::missing_path(
                "A path is required to locate the repository root",
            ));
        }
        let input = RootPathInput {
            path: path.to_string(),
        };
        validate_input(&input, "Invalid input data")?;

        let key = QueryKey::root_path(path);
        let response = match core.cache().get::<RootPathResponse>(&key) {
            Some(cached) => cached,
            None => {
                let response: RootPathResponse = invoke(
                    core,
                    Command::GetRoot,
                    &json!({ "path": path }),
                    "Failed to get repository root",
                    "Invalid repository root response",
                )
                .await?;
                core.cache().insert(key, &response);
                response
            }
        };

        if response.root_path.is_empty() {
            return Err(AppError::validation(
                "Invalid repository root response",
                "root_path: must not be empty",
            ));
        }

        let id = response
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| response.root_path.clone());
        let entry = RepositoryEntry::from_root(id, response.root_path);
        Ok(core.stores().repositories().register(entry))
    }

    /// Remove a repository and everything stored for it.
    pub fn remove_repository(core: &BranchDeckCore, id: &str) -> Option<RepositoryEntry> {
        let removed = core.stores().repositories().remove(id);
        core.stores().forget_repository(id);
        if let Some(entry) = &removed {
            core.cache().invalidate(&QueryKey::repository(&entry.path));
            core.cache().invalidate(&QueryKey::root_path(&entry.path));
            tracing::debug!(id = %id, path = %entry.path, "Removed repository");
        }
        removed
    }
}
