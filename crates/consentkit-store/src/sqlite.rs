//! SQLite-backed preference store.
//!
//! Persists the same typed values as [`crate::MemoryStore`], one row per key.
//! Batches run inside a single transaction.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use consentkit_core::{Error, Result};

use crate::schema::SCHEMA_SQL;
use crate::types::{Edit, PrefValue, PreferenceStore};

/// Preference store persisted to a SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store at `db_path`, creating parent directories.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::Storage(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "SqliteStore initialized: {} keys, path={}",
            store.count()?,
            store.db_path.display()
        );
        Ok(store)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Storage(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Storage(format!("Schema init failed: {}", e)))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Number of stored keys.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM preferences", [], |row| row.get(0))
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(count as usize)
    }

    fn read(&self, key: &str) -> Result<Option<PrefValue>> {
        let conn = self.conn.lock();
        let row: Option<(String, String)> = conn
            .prepare_cached("SELECT kind, value FROM preferences WHERE key = ?1")
            .map_err(|e| Error::Storage(e.to_string()))?
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(row.and_then(|(kind, raw)| {
            let value = PrefValue::from_parts(&kind, &raw);
            if value.is_none() {
                warn!("Unreadable preference {} (kind={})", key, kind);
            }
            value
        }))
    }
}

impl PreferenceStore for SqliteStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Preference read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn apply(&self, edits: Vec<Edit>) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(e.to_string()))?;

        for edit in &edits {
            match edit {
                Edit::Put(key, value) => {
                    tx.execute(
                        "INSERT INTO preferences (key, kind, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(key) DO UPDATE SET kind = excluded.kind, value = excluded.value, updated_at = excluded.updated_at",
                        params![key, value.kind(), value.to_string(), now],
                    )
                    .map_err(|e| Error::Storage(e.to_string()))?;
                }
                Edit::Remove(key) => {
                    tx.execute("DELETE FROM preferences WHERE key = ?1", params![key])
                        .map_err(|e| Error::Storage(e.to_string()))?;
                }
            }
        }

        tx.commit().map_err(|e| Error::Storage(e.to_string()))
    }

    fn keys(&self) -> Vec<String> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT key FROM preferences ORDER BY key")
            .and_then(|mut stmt| {
                let keys = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>();
                keys
            });
        match result {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Listing preference keys failed: {}", e);
                Vec::new()
            }
        }
    }
}
