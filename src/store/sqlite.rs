//! SQLite-backed store
//!
//! A single `kv` table; each `set` is an upsert inside its own transaction.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use super::{KeyValueStore, StoreError};

/// Schema SQL
const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database file, creating parent directories and schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Last write time (unix millis) for a key.
    #[cfg(test)]
    fn updated_at(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.lock()?;
        let ts = conn
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(ts)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire database lock: {}", e)))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            (key, value, chrono::Utc::now().timestamp_millis()),
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_upsert_overwrites() {
        let store = SqliteStore::in_memory().unwrap();
        store.set("currentProfileId", "guest").unwrap();
        store.set("currentProfileId", "abc").unwrap();
        assert_eq!(store.get("currentProfileId").unwrap().as_deref(), Some("abc"));
        assert!(store.updated_at("currentProfileId").unwrap().is_some());
        assert_eq!(store.get("profiles_salt").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("qhelper.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.set("profiles_salt", "[1,2,3]").unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get("profiles_salt").unwrap().as_deref(), Some("[1,2,3]"));
    }
}
