//! Whole-document unit storage backends.
//!
//! # Responsibility
//! - Hold every unit record as one ordered document.
//! - Offer only whole-document `load` and `save`; query logic lives in
//!   the repository layer.
//!
//! # Invariants
//! - `save` replaces the full document; stored order is list order.
//! - `load` rejects invalid persisted records instead of masking them.
//! - Backends are `Send + Sync`; cycle serialization is the caller's job.

mod json_file;
mod memory;
mod sqlite;

use crate::config::{StoreBackend, StoreConfig};
use crate::model::unit::Unit;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteUnitStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted layout: `{ "units": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDocument {
    pub units: Vec<Unit>,
}

/// Storage failures. All of them are fatal for the current request.
#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: std::io::Error },
    Serde { path: PathBuf, source: serde_json::Error },
    Sqlite(rusqlite::Error),
    /// The sqlite file was written by a newer table layout.
    UnsupportedLayout { found: u32, supported: u32 },
    InvalidData(String),
    /// A writer panicked while holding a store lock.
    Poisoned(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "store io error at {}: {source}", path.display()),
            Self::Serde { path, source } => {
                write!(f, "store document at {} is malformed: {source}", path.display())
            }
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedLayout { found, supported } => write!(
                f,
                "unit table layout {found} is newer than supported layout {supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted unit data: {message}"),
            Self::Poisoned(lock) => write!(f, "store lock `{lock}` poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serde { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedLayout { .. } | Self::InvalidData(_) | Self::Poisoned(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Durable holder of the unit document.
pub trait UnitStore: Send + Sync {
    /// Reads the whole document.
    fn load(&self) -> StoreResult<UnitDocument>;
    /// Replaces the whole document.
    fn save(&self, document: &UnitDocument) -> StoreResult<()>;
    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}

impl<S: UnitStore + ?Sized> UnitStore for Box<S> {
    fn load(&self) -> StoreResult<UnitDocument> {
        (**self).load()
    }

    fn save(&self, document: &UnitDocument) -> StoreResult<()> {
        (**self).save(document)
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

/// Opens the backend selected by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<Box<dyn UnitStore>> {
    let store: Box<dyn UnitStore> = match (config.backend, config.resolved_path()) {
        (StoreBackend::JsonFile, Some(path)) => Box::new(JsonFileStore::new(path)),
        (StoreBackend::Sqlite, Some(path)) => Box::new(SqliteUnitStore::open(path)?),
        _ => Box::new(MemoryStore::new()),
    };
    info!(
        "event=store_open module=store status=ok backend={} path={}",
        store.backend(),
        config
            .resolved_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::open_store;
    use crate::config::{StoreBackend, StoreConfig};

    #[test]
    fn open_store_follows_backend_choice() {
        let dir = tempfile::tempdir().unwrap();
        for (backend, expected) in [
            (StoreBackend::Memory, "memory"),
            (StoreBackend::JsonFile, "json_file"),
            (StoreBackend::Sqlite, "sqlite"),
        ] {
            let config = StoreConfig {
                backend,
                path: Some(dir.path().join(format!("units-{expected}"))),
            };
            assert_eq!(open_store(&config).unwrap().backend(), expected);
        }
    }
}
