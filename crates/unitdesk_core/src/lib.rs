//! Core domain logic for unitdesk.
//! This crate is the single source of truth for unit invariants and the
//! status transition policy.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod validate;

pub use config::{CoreConfig, StoreBackend, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::timestamp::{Timestamp, TimestampError};
pub use model::unit::{
    CreateUnit, Unit, UnitDraft, UnitId, UnitPatch, UnitStatus, UnitType, UnitValidationError,
};
pub use repo::unit_repo::{RepoError, RepoResult, StoreUnitRepository, UnitFilter, UnitRepository};
pub use service::clock::{Clock, SystemClock};
pub use service::transition::{
    check_transition, is_transition_allowed, TransitionError, OCCUPIED_TO_AVAILABLE_ERR,
};
pub use service::unit_service::{
    CreateStatusPolicy, ServiceError, ServiceResult, UnitService, UNIT_NOT_FOUND_ERR,
};
pub use store::{
    open_store, JsonFileStore, MemoryStore, SqliteUnitStore, StoreError, StoreResult,
    UnitDocument, UnitStore,
};
pub use validate::{FieldError, FieldIssue, ValidationErrors};

/// Minimal health-check API for wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
