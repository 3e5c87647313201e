//! In-process unit store.

use super::{StoreError, StoreResult, UnitDocument, UnitStore};
use std::sync::Mutex;

/// Keeps the document behind a mutex; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<UnitDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitStore for MemoryStore {
    fn load(&self) -> StoreResult<UnitDocument> {
        let document = self
            .document
            .lock()
            .map_err(|_| StoreError::Poisoned("memory_document"))?;
        Ok(document.clone())
    }

    fn save(&self, document: &UnitDocument) -> StoreResult<()> {
        let mut current = self
            .document
            .lock()
            .map_err(|_| StoreError::Poisoned("memory_document"))?;
        *current = document.clone();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::model::unit::{Unit, UnitDraft};
    use crate::store::{UnitDocument, UnitStore};

    #[test]
    fn load_returns_snapshot_not_live_view() {
        let store = MemoryStore::new();
        let mut snapshot = store.load().unwrap();
        snapshot.units.push(
            Unit::new(UnitDraft {
                name: Some("Pod 1".to_string()),
                ..UnitDraft::default()
            })
            .unwrap(),
        );

        assert!(store.load().unwrap().units.is_empty());
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), snapshot);
        store.save(&UnitDocument::default()).unwrap();
        assert!(store.load().unwrap().units.is_empty());
    }
}
