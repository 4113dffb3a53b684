//! SQLite-backed key-value storage.
//!
//! Everything the program persists lives under one `kv` table as
//! string-valued rows: the routine definition, the in-flight session
//! snapshot, and the per-task statistics map. Each value is replaced
//! wholesale on write, so a reader never observes a partial update.

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::StorageError;

/// Key-value database for persisted application state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/routinely/routinely.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("routinely.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_round_trip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn kv_set_replaces_the_whole_value() {
        let db = Database::open_memory().unwrap();
        db.kv_set("test", "first").unwrap();
        db.kv_set("test", "second").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "second");
    }

    #[test]
    fn kv_delete_removes_the_key() {
        let db = Database::open_memory().unwrap();
        db.kv_set("test", "hello").unwrap();
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        // Deleting an absent key is not an error.
        db.kv_delete("test").unwrap();
    }

    #[test]
    fn reopening_a_file_database_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routinely.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("routine", "[]").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("routine").unwrap().unwrap(), "[]");
    }
}
