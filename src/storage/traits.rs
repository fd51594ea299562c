//! Storage traits and error types
//!
//! This module defines the trait interface for output store backends and
//! associated error types.

use crate::api::{MatchId, MatchRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// A missing record is not an error: [`MatchStore::exists`] reports it as `false`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid match id for storage: {0:?}")]
    InvalidKey(String),

    #[error("Record path is not a regular file: {}", .0.display())]
    NotAFile(std::path::PathBuf),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable mapping from match id to raw match record
///
/// Implementations must make `put` atomic: a record is either absent or complete,
/// so `exists` returning true proves the record was fully written.
pub trait MatchStore {
    /// Returns true if a complete record is stored under `id`
    fn exists(&self, id: &MatchId) -> StorageResult<bool>;

    /// Stores `record` under `id`
    fn put(&mut self, id: &MatchId, record: &MatchRecord) -> StorageResult<()>;

    /// Number of stored records
    fn count(&self) -> StorageResult<u64>;
}

impl<S: MatchStore + ?Sized> MatchStore for Box<S> {
    fn exists(&self, id: &MatchId) -> StorageResult<bool> {
        (**self).exists(id)
    }

    fn put(&mut self, id: &MatchId, record: &MatchRecord) -> StorageResult<()> {
        (**self).put(id, record)
    }

    fn count(&self) -> StorageResult<u64> {
        (**self).count()
    }
}

impl<S: MatchStore + ?Sized> MatchStore for &mut S {
    fn exists(&self, id: &MatchId) -> StorageResult<bool> {
        (**self).exists(id)
    }

    fn put(&mut self, id: &MatchId, record: &MatchRecord) -> StorageResult<()> {
        (**self).put(id, record)
    }

    fn count(&self) -> StorageResult<u64> {
        (**self).count()
    }
}
