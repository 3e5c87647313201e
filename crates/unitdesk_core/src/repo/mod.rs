//! Repository layer over unit stores.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep store load/save details away from service orchestration.
//!
//! # Invariants
//! - Every operation is one serialized round trip through the store.
//! - Repository APIs never decide business rules such as transitions.

pub mod unit_repo;
