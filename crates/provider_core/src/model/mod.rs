//! Domain model for masters and their assigned applications.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - An application always belongs to exactly one master.
//! - Complexity values are non-negative integers.

pub mod application;
pub mod master;
mod validation;

pub use validation::{normalize_text, ValidationError};
