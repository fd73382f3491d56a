//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Session-log documents when the `sqlite` store backend is selected
//! - Key-value store for CLI state between invocations

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use crate::error::StoreError;

/// SQLite database in the data directory.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/pomotally.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join("pomotally.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                collection  TEXT NOT NULL,
                document_id TEXT NOT NULL,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (collection, document_id)
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Raw JSON body of a stored document.
    pub fn document_get(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND document_id = ?2",
                params![collection, document_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }

    /// Insert or overwrite a document body.
    pub fn document_put(
        &self,
        collection: &str,
        document_id: &str,
        body: &str,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (collection, document_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, document_id, body, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
