//! Storage module for collected match records
//!
//! The output store is both the durable record of collected matches and the
//! deduplication index: a match is collected exactly when the store has no record
//! for its id. Two backends implement [`MatchStore`]:
//! - [`FileStore`]: one `<match-id>.json` file per match in an output directory
//! - [`SqliteStore`]: one row per match in a SQLite database

mod files;
mod schema;
mod sqlite;
mod traits;

pub use files::FileStore;
pub use sqlite::SqliteStore;
pub use traits::{MatchStore, StorageError, StorageResult};

use crate::config::{OutputConfig, StoreBackend};
use std::path::Path;

/// Opens the backend selected in the output configuration
///
/// # Returns
///
/// * `Ok(Box<dyn MatchStore>)` - The opened store
/// * `Err(StorageError)` - The directory or database could not be opened
pub fn open_store(config: &OutputConfig) -> StorageResult<Box<dyn MatchStore>> {
    match config.backend {
        StoreBackend::Files => Ok(Box::new(FileStore::open(Path::new(&config.directory))?)),
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::new(Path::new(
            &config.database_path,
        ))?)),
    }
}

/// Checks that a match id can be used as a storage key
///
/// Ids become file names, so path separators, parent references and control
/// characters are refused.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());

    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
