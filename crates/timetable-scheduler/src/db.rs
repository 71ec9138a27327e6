use rusqlite::Connection;

use crate::error::PersistenceError;

/// Initialise the key-value schema in `conn`.
///
/// One row per entity category holding the whole collection as a JSON array,
/// mirroring the dashboard's per-category storage keys. Safe to call on every
/// startup.
pub fn init_db(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv_store (
            category    TEXT NOT NULL PRIMARY KEY,
            payload     TEXT NOT NULL,   -- JSON array of entries
            updated_at  TEXT NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}
