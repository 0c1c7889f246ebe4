//! Storage boundary for masters and applications.
//!
//! # Responsibility
//! - Define the row-oriented persistence contract consumed by services.
//! - Isolate SQLite query details from capacity decisions.
//! - Provide the transactional unit of work every mutation runs inside.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`MasterNotFound`,
//!   `ApplicationNotFound`) in addition to DB transport errors.
//! - Repositories never check capacity; services do.

pub mod provider_repo;
pub mod unit_of_work;
