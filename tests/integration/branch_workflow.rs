//! Integration tests for the branch management workflow
//!
//! Tests the flow: resolve root -> fetch repository -> select -> delete ->
//! restore, against a scripted backend, and checks the state left in the
//! stores at each step.

use branchdeck::backend::{BackendFailure, Command};
use branchdeck::core::services::RestoreBatchResult;
use branchdeck::data::{
    DeleteBranchesInput, IsCommitReachableInput, RestoreBranchInfo, RestoreBranchInput,
    RestoreBranchesInput, SimpleBranch, SwitchBranchInput,
};
use branchdeck::util::is_valid_date;
use branchdeck::{BranchService, ErrorKind, MockBackend, QueryKey, RepositoryService};
use serde_json::json;

use super::common::fixtures::{branch_json, memory_core, repository_json};

const ROOT: &str = "/home/dev/app";

fn delete_input(path: &str, names: &[&str]) -> DeleteBranchesInput {
    DeleteBranchesInput {
        path: path.to_string(),
        branches: names
            .iter()
            .map(|name| SimpleBranch {
                name: name.to_string(),
                current: false,
            })
            .collect(),
    }
}

fn restore_json(name: &str, success: bool) -> serde_json::Value {
    let message = if success { "Restored" } else { "Branch already exists" };
    json!({
        "success": success,
        "branchName": name,
        "message": message,
        "requiresUserAction": !success,
        "skipped": false
    })
}

#[tokio::test]
async fn test_full_branch_workflow() {
    let backend = MockBackend::new()
        .with_json(Command::GetRoot, &json!({ "root_path": ROOT, "id": "app-1" }))
        .with_json(
            Command::GetRepoInfo,
            &repository_json("app-1", ROOT, &["main", "feature", "bugfix"]),
        )
        .with_json(
            Command::DeleteBranches,
            &json!([{ "branch": branch_json("feature", false), "raw_output": "Deleted branch feature" }]),
        )
        .with_json(Command::RestoreDeletedBranch, &restore_json("feature", true));
    let core = memory_core(&backend);

    // Open the repository.
    let entry = RepositoryService::resolve_root_path(&core, &format!("{ROOT}/src"))
        .await
        .unwrap();
    assert_eq!(entry.id, "app-1");
    assert_eq!(entry.name, "app");

    let repo = RepositoryService::query_repository(&core, Some(ROOT))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(repo.branches_count, 3);
    assert_eq!(
        core.stores().repositories().find_by_id("app-1").unwrap().branches_count,
        3
    );
    assert!(core.stores().last_fetched(Some("app-1")).unwrap().get().is_some());

    // Select and delete.
    let selected = core.stores().selected(Some(&entry.id)).unwrap();
    let locked = core.stores().locked(Some(&entry.id)).unwrap();
    selected.add(["feature"]);
    locked.add(["main"]);

    let deleted = BranchService::delete_branches(&core, &delete_input(ROOT, &["feature"]))
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    BranchService::record_deleted(&core, &entry.id, &deleted);

    // The mutation leaves selection to the caller.
    assert!(selected.has("feature"));
    assert!(locked.has("main"));
    selected.remove(["feature"]);

    let log = core.stores().deleted_branches(Some(&entry.id)).unwrap();
    let recorded = log.find("feature").unwrap();
    assert!(is_valid_date(recorded.deleted_at.as_deref().unwrap()));
    assert_eq!(recorded.is_reachable, Some(true));

    // The delete invalidated the cached repository.
    assert!(!core.cache().contains(&QueryKey::repository(ROOT)));
    RepositoryService::query_repository(&core, Some(ROOT)).await.unwrap();
    assert_eq!(backend.call_count(Command::GetRepoInfo), 2);

    // Restore.
    let input = RestoreBranchInput {
        path: ROOT.to_string(),
        branch_info: RestoreBranchInfo::for_branch(&recorded),
    };
    let result = BranchService::restore_deleted_branch(&core, &input).await.unwrap();
    assert!(result.success);
    BranchService::record_restored(&core, &entry.id, std::slice::from_ref(&result));
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_delete_with_empty_path_is_rejected_before_backend() {
    let backend = MockBackend::new().with_json(Command::DeleteBranches, &json!([]));
    let core = memory_core(&backend);

    let err = BranchService::delete_branches(&core, &delete_input("", &["feature"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert!(err.is_recoverable());
    assert!(err.description.as_deref().unwrap().contains("path"));
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn test_delete_with_blank_branch_name_names_the_item() {
    let backend = MockBackend::new();
    let core = memory_core(&backend);

    let err = BranchService::delete_branches(&core, &delete_input(ROOT, &["ok", ""]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(
        err.description.as_deref(),
        Some("branches.1.name: Branch name is required")
    );
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_passed_through() {
    let backend = MockBackend::new().with_failure(
        Command::DeleteBranches,
        BackendFailure::new("Cannot delete the current branch")
            .with_kind("git_error")
            .with_description("error: Cannot delete branch 'main' checked out"),
    );
    let core = memory_core(&backend);
    let selected = core.stores().selected(Some("app")).unwrap();
    selected.add(["main"]);

    let err = BranchService::delete_branches(&core, &delete_input(ROOT, &["main"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::TauriError);
    assert_eq!(err.message, "Cannot delete the current branch");
    assert_eq!(
        err.description.as_deref(),
        Some("error: Cannot delete branch 'main' checked out")
    );
    assert!(!err.is_recoverable());
    assert!(selected.has("main"));
}

#[tokio::test]
async fn test_malformed_response_is_a_backend_error() {
    let backend = MockBackend::new().with_response(Command::GetRepoInfo, "{\"id\": ");
    let core = memory_core(&backend);

    let err = RepositoryService::fetch_repository(&core, ROOT).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TauriError);
    assert_eq!(err.message, "Malformed backend response");
}

#[tokio::test]
async fn test_wrong_shape_names_the_path() {
    let mut payload = repository_json("app-1", ROOT, &["main"]);
    payload["branches"][0]["current"] = json!("yes");
    let backend = MockBackend::new().with_json(Command::GetRepoInfo, &payload);
    let core = memory_core(&backend);

    let err = RepositoryService::fetch_repository(&core, ROOT).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert!(err.description.unwrap().starts_with("branches[0].current:"));
}

#[tokio::test]
async fn test_batch_restore_reports_each_branch() {
    let backend = MockBackend::new().with_json(
        Command::RestoreDeletedBranches,
        &json!([["a", restore_json("a", true)], ["b", restore_json("b", false)]]),
    );
    let core = memory_core(&backend);
    let log = core.stores().deleted_branches(Some("app")).unwrap();
    for name in ["a", "b"] {
        let branch = serde_json::from_value(branch_json(name, false)).unwrap();
        log.add_deleted_branch(branch);
    }

    let infos = log.list().iter().map(RestoreBranchInfo::for_branch).collect();
    let results: RestoreBatchResult = BranchService::restore_deleted_branches(
        &core,
        &RestoreBranchesInput {
            path: ROOT.to_string(),
            branch_infos: infos,
        },
    )
    .await
    .unwrap();

    let outcomes: Vec<_> = results.into_iter().map(|(_, result)| result).collect();
    BranchService::record_restored(&core, "app", &outcomes);
    assert_eq!(log.list().len(), 1);
    assert!(log.contains("b"));
    assert!(outcomes[1].requires_user_action);
}

#[tokio::test]
async fn test_batch_restore_needs_a_branch() {
    let backend = MockBackend::new();
    let core = memory_core(&backend);

    let err = BranchService::restore_deleted_branches(
        &core,
        &RestoreBranchesInput {
            path: ROOT.to_string(),
            branch_infos: Vec::new(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(
        err.description.as_deref(),
        Some("branchInfos: At least one branch is required")
    );
}

#[tokio::test]
async fn test_reachability_marks_deleted_branches() {
    let backend = MockBackend::new();
    backend.push(Command::IsCommitReachable, Ok(json!({"isReachable": false}).to_string()));
    let core = memory_core(&backend);
    let log = core.stores().deleted_branches(Some("app")).unwrap();
    log.add_deleted_branch(serde_json::from_value(branch_json("gone", false)).unwrap());

    BranchService::refresh_deleted_reachability(&core, "app", ROOT)
        .await
        .unwrap();
    assert_eq!(log.find("gone").unwrap().is_reachable, Some(false));

    // Cached per SHA: asking again does not reach the backend.
    let again = BranchService::is_commit_reachable(
        &core,
        &IsCommitReachableInput {
            path: ROOT.to_string(),
            commit_sha: "gone-0123456789".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(again, Some(false));
    assert_eq!(backend.call_count(Command::IsCommitReachable), 1);
}

#[tokio::test]
async fn test_switch_branch_invalidates_repository() {
    let backend = MockBackend::new()
        .with_json(Command::GetRepoInfo, &repository_json("app-1", ROOT, &["main", "dev"]))
        .with_response(Command::SwitchBranch, "Switched to branch 'dev'");
    let core = memory_core(&backend);

    RepositoryService::query_repository(&core, Some(ROOT)).await.unwrap();
    let message = BranchService::switch_branch(
        &core,
        &SwitchBranchInput {
            path: ROOT.to_string(),
            branch: "dev".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(message, "Switched to branch 'dev'");
    assert_eq!(
        backend.calls_to(Command::SwitchBranch)[0],
        json!({"path": ROOT, "branch": "dev"})
    );
    assert!(!core.cache().contains(&QueryKey::repository(ROOT)));
}

#[tokio::test]
async fn test_removing_repository_clears_other_views() {
    let backend = MockBackend::new()
        .with_json(Command::GetRoot, &json!({ "rootPath": ROOT }));
    let core = memory_core(&backend);
    let other = core.open_view();

    let entry = RepositoryService::resolve_root_path(&core, ROOT).await.unwrap();
    let watched = other.stores().selected(Some(&entry.id)).unwrap();
    core.stores().selected(Some(&entry.id)).unwrap().add(["feature"]);
    assert!(watched.has("feature"));

    RepositoryService::remove_repository(&core, &entry.id).unwrap();
    assert!(watched.is_empty());
    assert!(other.stores().repositories().is_empty());
}
