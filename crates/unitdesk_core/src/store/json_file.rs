//! Single JSON document on disk.
//!
//! # Invariants
//! - A missing file loads as an empty document.
//! - Saves go through a temp file in the same directory and an atomic
//!   rename, so readers never see a partial document.

use super::{StoreError, StoreResult, UnitDocument, UnitStore};
use log::error;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-backed store holding `{ "units": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomically(&self, bytes: &[u8]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| self.io_error(err))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|err| self.io_error(err))?;
        temp.write_all(bytes).map_err(|err| self.io_error(err))?;
        temp.as_file().sync_all().map_err(|err| self.io_error(err))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

impl UnitStore for JsonFileStore {
    fn load(&self) -> StoreResult<UnitDocument> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(UnitDocument::default()),
            Err(err) => {
                error!(
                    "event=store_load module=store status=error backend=json_file error_code=read_failed error={}",
                    err
                );
                return Err(self.io_error(err));
            }
        };

        serde_json::from_str(&contents).map_err(|source| {
            error!(
                "event=store_load module=store status=error backend=json_file error_code=parse_failed error={}",
                source
            );
            StoreError::Serde {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn save(&self, document: &UnitDocument) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Serde {
            path: self.path.clone(),
            source,
        })?;
        self.write_atomically(&bytes).inspect_err(|err| {
            error!(
                "event=store_save module=store status=error backend=json_file error_code=write_failed error={}",
                err
            );
        })
    }

    fn backend(&self) -> &'static str {
        "json_file"
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileStore;
    use crate::store::{StoreError, UnitStore};

    #[test]
    fn missing_file_loads_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("units.json"));
        assert!(store.load().unwrap().units.is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.json");
        std::fs::write(&path, "{ \"units\": [ { \"id\": 1 } ] }").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Serde { .. }), "unexpected: {err}");
    }
}
