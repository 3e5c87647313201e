//! Unit domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one record shape for storage, service and wire payloads.
//!
//! # Invariants
//! - Every unit is identified by a stable `UnitId`.
//! - Units are never deleted individually; only bulk-clear removes them.

pub mod timestamp;
pub mod unit;
