//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the unit status transition policy.
//! - Keep request boundaries decoupled from storage details.

pub mod clock;
pub mod transition;
pub mod unit_service;
