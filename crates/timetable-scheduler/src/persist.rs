//! Durable storage for committed routine entries.
//!
//! The scheduler loads a category once at startup and saves the full
//! collection before publishing every committed mutation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::db::init_db;
use crate::error::PersistenceError;
use crate::types::ScheduleEntry;

/// Key-value persistence keyed by entity category (e.g. `"routineEntries"`).
pub trait Persistence: Send + Sync {
    /// Every entry stored under `category`; empty if nothing was saved yet.
    fn load(&self, category: &str) -> Result<Vec<ScheduleEntry>, PersistenceError>;

    /// Replace the stored collection for `category`.
    fn save(&self, category: &str, entries: &[ScheduleEntry]) -> Result<(), PersistenceError>;
}

/// SQLite-backed persistence.
pub struct SqlitePersistence {
    conn: Mutex<Connection>,
}

impl SqlitePersistence {
    /// Wrap `conn`, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self, PersistenceError> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::new(conn)
    }

    /// Private in-memory database; contents vanish with the value.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::new(Connection::open_in_memory()?)
    }
}

impl Persistence for SqlitePersistence {
    fn load(&self, category: &str) -> Result<Vec<ScheduleEntry>, PersistenceError> {
        let conn = self.conn.lock();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM kv_store WHERE category = ?1",
                [category],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, category: &str, entries: &[ScheduleEntry]) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(entries)?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv_store (category, payload, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(category) DO UPDATE
             SET payload = excluded.payload, updated_at = excluded.updated_at",
            rusqlite::params![category, payload, now],
        )?;
        debug!(%category, count = entries.len(), "category saved");
        Ok(())
    }
}

/// In-process persistence for tests and throwaway runs.
///
/// `fail_saves(true)` makes every subsequent `save` return
/// [`PersistenceError::Unavailable`].
#[derive(Default)]
pub struct MemoryPersistence {
    categories: DashMap<String, Vec<ScheduleEntry>>,
    failing: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, category: &str) -> Result<Vec<ScheduleEntry>, PersistenceError> {
        Ok(self
            .categories
            .get(category)
            .map(|entries| entries.value().clone())
            .unwrap_or_default())
    }

    fn save(&self, category: &str, entries: &[ScheduleEntry]) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(format!(
                "save of '{category}' refused"
            )));
        }
        self.categories
            .insert(category.to_string(), entries.to_vec());
        Ok(())
    }
}
