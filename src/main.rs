use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use branchdeck::backend::{Backend, BackendFailure, Command};
use branchdeck::data::RepositoryEntry;
use branchdeck::util;
use branchdeck::{BranchDeckCore, Config, RepositoryService};
use clap::{Parser, Subcommand};

/// Inspect and edit the persisted branch state of BranchDeck
#[derive(Debug, Parser)]
#[command(name = "branchdeck", version)]
struct Cli {
    /// Data directory (defaults to ~/.branchdeck)
    #[arg(long, global = true, env = "BRANCHDECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// List known repositories
    Repos,
    /// Add a repository root to the list
    Add {
        path: String,
        /// Identifier to store it under (defaults to the path)
        #[arg(long)]
        id: Option<String>,
    },
    /// Select branches
    Select { repo: String, branches: Vec<String> },
    /// Deselect branches
    Deselect { repo: String, branches: Vec<String> },
    /// Lock branches against deletion
    Lock { repo: String, branches: Vec<String> },
    /// Unlock branches
    Unlock { repo: String, branches: Vec<String> },
    /// Show the stored state of one repository
    Show { repo: String },
    /// Set the branch search filter
    Search { repo: String, text: String },
    /// Remove a repository and everything stored for it
    Forget { repo: String },
}

/// Git operations are not available from the command line.
struct Offline;

#[async_trait]
impl Backend for Offline {
    async fn invoke(&self, command: Command, _args: serde_json::Value) -> Result<String, BackendFailure> {
        Err(BackendFailure::new(format!("{command} is not available offline")))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    // Initialize logging to file (<data_dir>/logs/branchdeck.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load();
    let core = BranchDeckCore::new(config, Arc::new(Offline));
    if !core.is_durable() {
        eprintln!("warning: storage is not durable, changes will be lost");
    }

    run(&core, cli.command)
}

fn run(core: &BranchDeckCore, command: Cmd) -> Result<()> {
    let stores = core.stores();
    match command {
        Cmd::Repos => {
            for entry in stores.repositories().list() {
                println!(
                    "{}\t{}\t{}\t{} branches",
                    entry.id, entry.name, entry.path, entry.branches_count
                );
            }
        }
        Cmd::Add { path, id } => {
            if path.is_empty() {
                bail!("No path provided");
            }
            let id = id.unwrap_or_else(|| path.clone());
            let entry = stores.repositories().register(RepositoryEntry::from_root(id, path));
            println!("{}\t{}", entry.id, entry.path);
        }
        Cmd::Select { repo, branches } => {
            if let Some(set) = stores.selected(Some(&resolve(core, &repo))) {
                set.add(branches);
            }
        }
        Cmd::Deselect { repo, branches } => {
            if let Some(set) = stores.selected(Some(&resolve(core, &repo))) {
                set.remove(branches);
            }
        }
        Cmd::Lock { repo, branches } => {
            if let Some(set) = stores.locked(Some(&resolve(core, &repo))) {
                set.add(branches);
            }
        }
        Cmd::Unlock { repo, branches } => {
            if let Some(set) = stores.locked(Some(&resolve(core, &repo))) {
                set.remove(branches);
            }
        }
        Cmd::Show { repo } => {
            let id = resolve(core, &repo);
            let repository = Some(id.as_str());
            let list = |set: Option<Arc<branchdeck::SetContainer>>| {
                set.map(|s| s.list().join(", ")).unwrap_or_default()
            };
            println!("repository: {id}");
            println!("selected: {}", list(stores.selected(repository)));
            println!("locked: {}", list(stores.locked(repository)));
            let search = stores.search(repository).map(|s| s.query()).unwrap_or_default();
            println!("search: {search}");
            let fetched = stores
                .last_fetched(repository)
                .and_then(|c| c.get())
                .map(util::to_iso_string)
                .unwrap_or_else(|| "never".to_string());
            println!("last fetched: {fetched}");
            if let Some(deleted) = stores.deleted_branches(repository) {
                for branch in deleted.list() {
                    println!(
                        "deleted: {} ({})",
                        branch.name,
                        branch.deleted_at.unwrap_or_default()
                    );
                }
            }
        }
        Cmd::Search { repo, text } => {
            if let Some(search) = stores.search(Some(&resolve(core, &repo))) {
                search.set(text);
                search.flush();
            }
        }
        Cmd::Forget { repo } => {
            let id = resolve(core, &repo);
            match RepositoryService::remove_repository(core, &id) {
                Some(entry) => println!("removed {}", entry.path),
                None => println!("no repository {id}; cleared stored state"),
            }
        }
    }
    Ok(())
}

/// Repository id for an id or path argument.
fn resolve(core: &BranchDeckCore, repo: &str) -> String {
    core.stores()
        .repositories()
        .resolve(repo)
        .map(|entry| entry.id)
        .unwrap_or_else(|| repo.to_string())
}
