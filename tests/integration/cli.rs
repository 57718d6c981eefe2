//! Integration tests for the `branchdeck` binary
//!
//! Each test points the binary at its own data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn branchdeck(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("branchdeck").expect("binary is built");
    cmd.arg("--data-dir").arg(home.path());
    cmd
}

#[test]
fn test_add_then_list_repositories() {
    let home = TempDir::new().unwrap();

    branchdeck(&home)
        .args(["add", "/home/dev/app", "--id", "app"])
        .assert()
        .success();
    branchdeck(&home)
        .args(["add", "/home/dev/app", "--id", "duplicate"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("app\t/home/dev/app"));

    branchdeck(&home)
        .arg("repos")
        .assert()
        .success()
        .stdout(predicate::str::contains("app\tapp\t/home/dev/app\t0 branches"))
        .stdout(predicate::str::contains("duplicate").not());
}

#[test]
fn test_selection_and_locks_persist_between_runs() {
    let home = TempDir::new().unwrap();
    branchdeck(&home)
        .args(["add", "/home/dev/app", "--id", "app"])
        .assert()
        .success();

    branchdeck(&home)
        .args(["select", "app", "feature", "bugfix", "old"])
        .assert()
        .success();
    branchdeck(&home)
        .args(["deselect", "/home/dev/app", "old"])
        .assert()
        .success();
    branchdeck(&home)
        .args(["lock", "app", "main"])
        .assert()
        .success();

    branchdeck(&home)
        .args(["show", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repository: app"))
        .stdout(predicate::str::contains("selected: bugfix, feature\n"))
        .stdout(predicate::str::contains("locked: main\n"))
        .stdout(predicate::str::contains("last fetched: never"));
}

#[test]
fn test_search_is_written_before_exit() {
    let home = TempDir::new().unwrap();

    branchdeck(&home)
        .args(["search", "app", "feat"])
        .assert()
        .success();

    branchdeck(&home)
        .args(["show", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("search: feat\n"));
}

#[test]
fn test_forget_clears_repository_state() {
    let home = TempDir::new().unwrap();
    branchdeck(&home)
        .args(["add", "/home/dev/app", "--id", "app"])
        .assert()
        .success();
    branchdeck(&home)
        .args(["select", "app", "feature"])
        .assert()
        .success();

    branchdeck(&home)
        .args(["forget", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed /home/dev/app"));

    branchdeck(&home)
        .arg("repos")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    branchdeck(&home)
        .args(["show", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("selected: \n"));
}

#[test]
fn test_data_dir_from_environment() {
    let home = TempDir::new().unwrap();

    Command::cargo_bin("branchdeck")
        .unwrap()
        .env("BRANCHDECK_DATA_DIR", home.path())
        .args(["lock", "app", "main"])
        .assert()
        .success();

    assert!(home.path().join("branchdeck.db").exists());
    assert!(home.path().join("config.toml").exists());
    branchdeck(&home)
        .args(["show", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locked: main"));
}

#[test]
fn test_missing_subcommand_fails() {
    let home = TempDir::new().unwrap();
    branchdeck(&home).assert().failure();
}
