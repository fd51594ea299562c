//! Database schema for the SQLite match store

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per collected match; the raw document is stored unmodified
CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT PRIMARY KEY NOT NULL,
    payload BLOB NOT NULL,
    stored_at TEXT NOT NULL
);
"#;

/// Creates the tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
