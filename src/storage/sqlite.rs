//! SQLite storage implementation
//!
//! Each `put` runs in its own transaction, so a row is visible only once the
//! whole payload is committed.

use crate::api::{MatchId, MatchRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{MatchStore, StorageResult};
use crate::storage::validate_key;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite match store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns the stored payload for `id`
    pub fn get(&self, id: &MatchId) -> StorageResult<Option<Vec<u8>>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM matches WHERE match_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }
}

impl MatchStore for SqliteStore {
    fn exists(&self, id: &MatchId) -> StorageResult<bool> {
        validate_key(id.as_str())?;
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM matches WHERE match_id = ?1 LIMIT 1",
                params![id.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn put(&mut self, id: &MatchId, record: &MatchRecord) -> StorageResult<()> {
        validate_key(id.as_str())?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO matches (match_id, payload, stored_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), record.as_bytes(), Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
