//! SQLite file holding the persisted stores

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use super::kv_store::SqliteKvStore;
use super::migrations;

/// How long a writer waits for another process holding the file lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Shared connection to the state database.
///
/// Clones share one connection. Every open view of the application may
/// hold the same file, so connections wait on the file lock instead of
/// failing and the journal runs in WAL mode.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open (creating it and its directory if needed) and migrate the
    /// database at `path`.
    pub fn open(path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal = %mode, "Opened state database");

        Self::migrated(conn, path)
    }

    /// A private in-memory database, migrated like a file would be.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    fn migrated(mut conn: Connection, path: PathBuf) -> Result<Self, DatabaseError> {
        migrations::run_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The shared connection, for stores built on this database.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Key-value store over this database.
    pub fn kv_store(&self) -> SqliteKvStore {
        SqliteKvStore::new(self.connection())
    }

    /// Highest applied migration version.
    pub fn schema_version(&self) -> Result<i64, DatabaseError> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
        })
    }

    /// Run `f` while holding the connection.
    pub fn with_connection<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(f(&conn)?)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
