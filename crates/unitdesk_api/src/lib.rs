//! Request boundary for unit operations.
//!
//! # Responsibility
//! - Turn raw JSON bodies and path/query values into typed payloads.
//! - Map typed service outcomes to `(status, JSON body)` responses.
//! - Host the handlers on an axum `Router` under `/api/units`.
//!
//! # Invariants
//! - Handlers never panic and always return a response.
//! - Validation failures are answered before the service is called.

pub mod error;
pub mod paths;
pub mod response;
pub mod router;
pub mod units;

pub use error::ApiError;
pub use response::{ApiResponse, StatusCode};
pub use router::{router, serve};
pub use units::{ListQuery, UnitsApi};
