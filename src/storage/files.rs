//! File-per-match storage
//!
//! Each record lives in `<directory>/<match-id>.json`. Records are written to a
//! temporary file in the same directory, synced, then renamed into place, so a
//! `.json` file only ever appears complete.

use crate::api::{MatchId, MatchRecord};
use crate::storage::traits::{MatchStore, StorageError, StorageResult};
use crate::storage::validate_key;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const RECORD_EXTENSION: &str = "json";

/// Output directory holding one JSON file per match
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Opens the store, creating the directory if needed
    pub fn open(directory: &Path) -> StorageResult<Self> {
        fs::create_dir_all(directory)?;
        Ok(Self {
            directory: directory.to_path_buf(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the record for `id`
    pub fn record_path(&self, id: &MatchId) -> StorageResult<PathBuf> {
        validate_key(id.as_str())?;
        Ok(self
            .directory
            .join(format!("{}.{}", id.as_str(), RECORD_EXTENSION)))
    }

    /// Writes through a temporary file and renames it to `<id>.json`
    ///
    /// If `write` fails the temporary file is removed and no record appears.
    fn write_atomically<F>(&self, id: &MatchId, write: F) -> StorageResult<()>
    where
        F: FnOnce(&mut fs::File) -> io::Result<()>,
    {
        let path = self.record_path(id)?;

        let mut temp = NamedTempFile::new_in(&self.directory)?;
        write(temp.as_file_mut())?;
        temp.as_file_mut().flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl MatchStore for FileStore {
    fn exists(&self, id: &MatchId) -> StorageResult<bool> {
        let path = self.record_path(id)?;
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => Ok(true),
            Ok(_) => Err(StorageError::NotAFile(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, id: &MatchId, record: &MatchRecord) -> StorageResult<()> {
        self.write_atomically(id, |file| file.write_all(record.as_bytes()))
    }

    fn count(&self) -> StorageResult<u64> {
        let mut count = 0;
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION)
            {
                count += 1;
            }
        }
        Ok(count)
    }
}
