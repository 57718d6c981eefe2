//! Locations of the files BranchDeck keeps on disk
//!
//! Everything lives under one data directory: `~/.branchdeck` unless a
//! different directory is chosen once at start-up.

use std::path::PathBuf;
use std::sync::OnceLock;

const DIR_NAME: &str = ".branchdeck";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Choose the data directory. `None` keeps the default.
///
/// Only the first call has an effect; it must happen before any path below
/// is asked for. Returns whether this call set the directory.
pub fn init_data_dir(custom_path: Option<PathBuf>) -> bool {
    let path = custom_path.unwrap_or_else(default_data_dir);
    match DATA_DIR.set(path) {
        Ok(()) => true,
        Err(ignored) => {
            tracing::debug!(
                ignored = %ignored.display(),
                current = %data_dir().display(),
                "Data directory already chosen"
            );
            false
        }
    }
}

fn default_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DIR_NAME),
        None => PathBuf::from(DIR_NAME),
    }
}

pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// `<data_dir>/branchdeck.db`
pub fn database_path() -> PathBuf {
    data_dir().join("branchdeck.db")
}

pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// `<data_dir>/logs/branchdeck.log`
pub fn log_file_path() -> PathBuf {
    logs_dir().join("branchdeck.log")
}

/// `<data_dir>/config.toml`
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
