//! Unit repository contract and store-backed implementation.
//!
//! # Responsibility
//! - Provide query and mutation APIs over the whole-document store.
//! - Serialize every load -> mutate -> save cycle.
//!
//! # Invariants
//! - Ids are unique within the document; `create` refuses duplicates.
//! - Nothing that fails `Unit::validate` is ever saved, so a stored
//!   document always loads back.
//! - `update` on an unknown id is a silent no-op. Callers that need a
//!   not-found signal must check first.
//! - List order is stored order.

use crate::model::unit::{Unit, UnitId, UnitPatch, UnitStatus, UnitType, UnitValidationError};
use crate::store::{StoreError, UnitDocument, UnitStore};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for unit persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    DuplicateId(UnitId),
    /// The record to be written breaks unit invariants.
    Invalid(UnitValidationError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "unit id already exists: {id}"),
            Self::Invalid(err) => write!(f, "refusing to store invalid unit: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::DuplicateId(_) => None,
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Exact-match filter for listing units. Set fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub name: Option<String>,
    pub status: Option<UnitStatus>,
    pub kind: Option<UnitType>,
}

impl UnitFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.kind.is_none()
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        self.name.as_ref().map_or(true, |name| unit.name == *name)
            && self.status.map_or(true, |status| unit.status == status)
            && self.kind.map_or(true, |kind| unit.kind == kind)
    }
}

/// Repository interface for unit operations.
pub trait UnitRepository {
    fn exists(&self, id: UnitId) -> RepoResult<bool>;
    fn list_all(&self, filter: &UnitFilter) -> RepoResult<Vec<Unit>>;
    fn get_one(&self, id: UnitId) -> RepoResult<Option<Unit>>;
    fn create(&self, unit: &Unit) -> RepoResult<()>;
    fn update(&self, id: UnitId, patch: &UnitPatch) -> RepoResult<()>;
    /// Administrative bulk clear.
    fn delete_all(&self) -> RepoResult<()>;
}

impl<R: UnitRepository + ?Sized> UnitRepository for &R {
    fn exists(&self, id: UnitId) -> RepoResult<bool> {
        (**self).exists(id)
    }

    fn list_all(&self, filter: &UnitFilter) -> RepoResult<Vec<Unit>> {
        (**self).list_all(filter)
    }

    fn get_one(&self, id: UnitId) -> RepoResult<Option<Unit>> {
        (**self).get_one(id)
    }

    fn create(&self, unit: &Unit) -> RepoResult<()> {
        (**self).create(unit)
    }

    fn update(&self, id: UnitId, patch: &UnitPatch) -> RepoResult<()> {
        (**self).update(id, patch)
    }

    fn delete_all(&self) -> RepoResult<()> {
        (**self).delete_all()
    }
}

/// Repository over any whole-document `UnitStore`.
///
/// All operations, reads included, go through one gate so a save can never
/// interleave with another cycle's load.
pub struct StoreUnitRepository<S: UnitStore> {
    store: S,
    gate: Mutex<()>,
}

impl<S: UnitStore> StoreUnitRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, ()>> {
        self.gate
            .lock()
            .map_err(|_| RepoError::Store(StoreError::Poisoned("repository_gate")))
    }

    fn read(&self) -> RepoResult<UnitDocument> {
        let _guard = self.lock()?;
        Ok(self.store.load()?)
    }

    /// Runs one serialized cycle. `mutate` returns whether to save.
    fn write(&self, mutate: impl FnOnce(&mut UnitDocument) -> RepoResult<bool>) -> RepoResult<()> {
        let _guard = self.lock()?;
        let mut document = self.store.load()?;
        if mutate(&mut document)? {
            self.store.save(&document)?;
        }
        Ok(())
    }
}

impl<S: UnitStore> UnitRepository for StoreUnitRepository<S> {
    fn exists(&self, id: UnitId) -> RepoResult<bool> {
        Ok(self.read()?.units.iter().any(|unit| unit.id == id))
    }

    fn list_all(&self, filter: &UnitFilter) -> RepoResult<Vec<Unit>> {
        let document = self.read()?;
        if filter.is_empty() {
            return Ok(document.units);
        }
        Ok(document
            .units
            .into_iter()
            .filter(|unit| filter.matches(unit))
            .collect())
    }

    fn get_one(&self, id: UnitId) -> RepoResult<Option<Unit>> {
        Ok(self
            .read()?
            .units
            .into_iter()
            .find(|unit| unit.id == id))
    }

    fn create(&self, unit: &Unit) -> RepoResult<()> {
        unit.validate().map_err(RepoError::Invalid)?;
        self.write(|document| {
            if document.units.iter().any(|existing| existing.id == unit.id) {
                return Err(RepoError::DuplicateId(unit.id));
            }
            document.units.push(unit.clone());
            Ok(true)
        })
    }

    fn update(&self, id: UnitId, patch: &UnitPatch) -> RepoResult<()> {
        self.write(|document| {
            match document.units.iter_mut().find(|unit| unit.id == id) {
                Some(unit) => {
                    let mut merged = unit.clone();
                    patch.apply_to(&mut merged);
                    merged.validate().map_err(RepoError::Invalid)?;
                    *unit = merged;
                    Ok(true)
                }
                None => {
                    debug!("event=unit_update module=repo status=skipped reason=not_found unit_id={id}");
                    Ok(false)
                }
            }
        })
    }

    fn delete_all(&self) -> RepoResult<()> {
        self.write(|document| {
            document.units.clear();
            Ok(true)
        })
    }
}
