use super::PersistenceAdapter;
use crate::errors::{LedgerError, LedgerResult, PersistenceError};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type DbPool = Arc<Mutex<Connection>>;

/// SQLite-backed key-value store. One row per key, value overwritten in place.
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
}

impl SqliteStore {
    pub fn open(data_dir: &Path) -> LedgerResult<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| LedgerError::Database(format!("create dir: {e}")))?;
        let db_path = data_dir.join("bond_ledger.db");
        let conn = Connection::open(&db_path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self::init(conn)?;
        tracing::info!("database initialized at {}", db_path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> LedgerResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> LedgerResult<Self> {
        let schema = include_str!("../../migrations/001_init.sql");
        conn.execute_batch(schema)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }
}

impl PersistenceAdapter for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let conn = self
            .db
            .lock()
            .map_err(|e| PersistenceError::Unavailable(format!("lock poisoned: {e}")))?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let conn = self
            .db
            .lock()
            .map_err(|e| PersistenceError::Unavailable(format!("lock poisoned: {e}")))?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}
