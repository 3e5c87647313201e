//! Unit use-case service.
//!
//! # Responsibility
//! - Enforce the status transition policy on updates.
//! - Stamp `lastUpdated` on every successful update.
//! - Apply the configured create-status policy.
//!
//! # Invariants
//! - Not-found is decided before the transition rule, so one request gets
//!   at most one of the two errors.
//! - `lastUpdated` strictly increases per unit across successful updates.
//! - Update check-then-write runs under one gate; a concurrent update or
//!   clear can not slip in between the status check and the write.

use crate::model::unit::{CreateUnit, Unit, UnitDraft, UnitId, UnitPatch, UnitValidationError};
use crate::repo::unit_repo::{RepoError, UnitFilter, UnitRepository};
use crate::service::clock::{Clock, SystemClock};
use crate::service::transition::{check_transition, TransitionError};
use crate::store::StoreError;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Fixed message for a missing unit.
pub const UNIT_NOT_FOUND_ERR: &str = "Unit not found!";

/// What `create_unit` does with the status supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStatusPolicy {
    /// Every new unit starts `Available`; the requested status is dropped.
    #[default]
    ForceAvailable,
    /// Keep the status from the create payload.
    HonorRequested,
}

impl CreateStatusPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForceAvailable => "force_available",
            Self::HonorRequested => "honor_requested",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "force_available" => Some(Self::ForceAvailable),
            "honor_requested" => Some(Self::HonorRequested),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from unit service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Target unit does not exist.
    NotFound(UnitId),
    /// Requested status move is not permitted.
    TransitionForbidden(TransitionError),
    /// A built or merged record breaks unit invariants.
    Setup(UnitValidationError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(_) => f.write_str(UNIT_NOT_FOUND_ERR),
            Self::TransitionForbidden(err) => write!(f, "{err}"),
            Self::Setup(err) => write!(f, "invalid unit record: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::TransitionForbidden(err) => Some(err),
            Self::Setup(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Invalid(err) => Self::Setup(err),
            other => Self::Repo(other),
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(value: TransitionError) -> Self {
        Self::TransitionForbidden(value)
    }
}

/// Unit service facade over a repository implementation.
pub struct UnitService<R: UnitRepository> {
    repo: R,
    clock: Box<dyn Clock>,
    create_status: CreateStatusPolicy,
    update_gate: Mutex<()>,
}

impl<R: UnitRepository> UnitService<R> {
    /// Creates a service with the wall clock and `ForceAvailable`.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            clock: Box::new(SystemClock),
            create_status: CreateStatusPolicy::default(),
            update_gate: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_create_status(mut self, policy: CreateStatusPolicy) -> Self {
        self.create_status = policy;
        self
    }

    pub fn create_status(&self) -> CreateStatusPolicy {
        self.create_status
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Lists units matching every set field of `filter`.
    ///
    /// An empty-string name counts as unset.
    pub fn get_all(&self, filter: UnitFilter) -> ServiceResult<Vec<Unit>> {
        let filter = normalize_filter(filter);
        Ok(self.repo.list_all(&filter)?)
    }

    pub fn get_one(&self, id: UnitId) -> ServiceResult<Option<Unit>> {
        Ok(self.repo.get_one(id)?)
    }

    pub fn exists(&self, id: UnitId) -> ServiceResult<bool> {
        Ok(self.repo.exists(id)?)
    }

    /// Persists an already constructed unit.
    pub fn create_one(&self, unit: &Unit) -> ServiceResult<()> {
        self.repo.create(unit).inspect_err(|err| {
            error!(
                "event=unit_create module=service status=error unit_id={} error={err}",
                unit.id
            );
        })?;
        info!(
            "event=unit_create module=service status=ok unit_id={} type={} unit_status={}",
            unit.id, unit.kind, unit.status
        );
        Ok(())
    }

    /// Builds a unit from a validated create payload and persists it.
    ///
    /// # Contract
    /// - Id and `lastUpdated` are generated here.
    /// - Status follows the configured `CreateStatusPolicy`.
    pub fn create_unit(&self, payload: CreateUnit) -> ServiceResult<Unit> {
        let status = match self.create_status {
            CreateStatusPolicy::ForceAvailable => None,
            CreateStatusPolicy::HonorRequested => Some(payload.status),
        };
        let unit = Unit::new(UnitDraft {
            name: Some(payload.name),
            kind: Some(payload.kind),
            status,
            last_updated: Some(self.clock.now()),
            ..UnitDraft::default()
        })
        .map_err(ServiceError::Setup)?;

        self.create_one(&unit)?;
        Ok(unit)
    }

    /// Applies a partial update after enforcing the transition rule.
    ///
    /// Returns the patch as written, including the new `last_updated`.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `TransitionForbidden` for `Occupied -> Available`.
    /// - `Setup` when the merged record breaks unit invariants; nothing is
    ///   written.
    pub fn update_one(&self, id: UnitId, patch: UnitPatch) -> ServiceResult<UnitPatch> {
        let _guard = self.lock_updates()?;

        let existing = self.repo.get_one(id)?.ok_or(ServiceError::NotFound(id))?;

        if let Some(requested) = patch.status {
            if let Err(err) = check_transition(existing.status, requested) {
                warn!(
                    "event=unit_update module=service status=rejected reason=transition_forbidden unit_id={id} from={} to={}",
                    err.from, err.to
                );
                return Err(err.into());
            }
        }

        let mut applied = patch;
        applied.last_updated = Some(self.clock.now().after(existing.last_updated));

        self.repo.update(id, &applied).inspect_err(|err| {
            error!("event=unit_update module=service status=error unit_id={id} error={err}");
        })?;

        info!(
            "event=unit_update module=service status=ok unit_id={id} from={} to={}",
            existing.status,
            applied.status.unwrap_or(existing.status)
        );
        Ok(applied)
    }

    /// Administrative bulk clear.
    pub fn clear_all(&self) -> ServiceResult<()> {
        let _guard = self.lock_updates()?;
        self.repo.delete_all()?;
        warn!("event=unit_clear module=service status=ok");
        Ok(())
    }

    fn lock_updates(&self) -> ServiceResult<MutexGuard<'_, ()>> {
        self.update_gate.lock().map_err(|_| {
            ServiceError::from(RepoError::Store(StoreError::Poisoned("service_update_gate")))
        })
    }
}

fn normalize_filter(filter: UnitFilter) -> UnitFilter {
    UnitFilter {
        name: filter.name.filter(|name| !name.is_empty()),
        ..filter
    }
}
