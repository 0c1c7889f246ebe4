//! Core domain logic for provider management.
//! This crate is the single source of truth for the capacity invariant:
//! no master is ever assigned more application complexity than its ceiling.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::application::{Application, ApplicationDraft, ApplicationId};
pub use model::master::{Master, MasterDraft, MasterId, DEFAULT_MAX_COMPLEXITY};
pub use model::ValidationError;
pub use repo::provider_repo::{
    ProviderRepository, RepoError, RepoResult, SqliteProviderRepository,
};
pub use repo::unit_of_work::{SqliteUnitOfWork, UnitOfWork};
pub use service::assignment_service::AssignmentService;
pub use service::capacity::CapacityExceeded;
pub use service::master_service::MasterService;
pub use service::{ErrorKind, ServiceError, ServiceResult};

/// Minimal health-check API for callers probing linkage.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
