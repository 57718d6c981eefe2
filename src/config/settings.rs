use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::store::DEFAULT_SEARCH_DEBOUNCE;
use crate::util::{config_path, database_path};

/// Example configuration written on first run
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Persistence settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Whether state is written to the SQLite database
    pub durable: bool,
    /// Database file location
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            durable: true,
            database: database_path(),
        }
    }
}

/// Branch search settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet window before a search filter is persisted
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageConfig,
    pub search: SearchConfig,
}

/// TOML representation of storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlStorageConfig {
    pub durable: Option<bool>,
    pub database: Option<PathBuf>,
}

/// TOML representation of search configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSearchConfig {
    pub debounce_ms: Option<u64>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub storage: Option<TomlStorageConfig>,
    pub search: Option<TomlSearchConfig>,
}

impl Config {
    /// Load configuration from the data directory, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from `path`; a missing or unreadable file yields
    /// the defaults
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let Ok(contents) = fs::read_to_string(path) else {
            return config;
        };
        match toml::from_str::<TomlConfig>(&contents) {
            Ok(toml_config) => config.merge(toml_config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
            }
        }

        config
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(storage) = toml_config.storage {
            if let Some(durable) = storage.durable {
                self.storage.durable = durable;
            }
            if let Some(database) = storage.database {
                self.storage.database = database;
            }
        }

        if let Some(search) = toml_config.search {
            if let Some(debounce_ms) = search.debounce_ms {
                self.search.debounce = Duration::from_millis(debounce_ms);
            }
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "Failed to create config directory");
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    /// In-memory configuration: nothing is persisted
    pub fn ephemeral() -> Self {
        Self {
            storage: StorageConfig {
                durable: false,
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_database(mut self, path: PathBuf) -> Self {
        self.storage.durable = true;
        self.storage.database = path;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.storage.durable);
        assert_eq!(config.search.debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let parsed: TomlConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        let mut config = Config::default();
        config.merge(parsed);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[storage]\ndurable = false\ndatabase = \"/tmp/other.db\"\n\n[search]\ndebounce_ms = 50\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert!(!config.storage.durable);
        assert_eq!(config.storage.database, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.search.debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_or_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(Config::load_from(&path), Config::default());

        fs::write(&path, "[search\ndebounce_ms = ").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
