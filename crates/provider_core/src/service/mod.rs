//! Core use-case services.
//!
//! # Responsibility
//! - Gate every mutation that changes a master's assigned total.
//! - Map repository failures onto the caller-facing error taxonomy.
//!
//! # Invariants
//! - Every mutation runs inside exactly one unit of work.
//! - A rejected mutation leaves storage unchanged.

pub mod assignment_service;
pub mod capacity;
pub mod master_service;

use crate::model::application::ApplicationId;
use crate::model::master::MasterId;
use crate::model::ValidationError;
use crate::repo::provider_repo::RepoError;
use capacity::CapacityExceeded;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    CapacityExceeded,
    Validation,
    /// Storage or consistency failure unrelated to the request's content.
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Validation => "validation",
            Self::Infrastructure => "infrastructure",
        }
    }
}

/// Errors from master/application use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    MasterNotFound(MasterId),
    ApplicationNotFound {
        master_id: MasterId,
        application_id: ApplicationId,
    },
    CapacityExceeded(CapacityExceeded),
    /// Post-write verification found state that must never be committed.
    InconsistentState(&'static str),
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::MasterNotFound(_) | Self::ApplicationNotFound { .. } => ErrorKind::NotFound,
            Self::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            Self::InconsistentState(_) | Self::Repo(_) => ErrorKind::Infrastructure,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MasterNotFound(id) => write!(f, "master not found: {id}"),
            Self::ApplicationNotFound {
                master_id,
                application_id,
            } => write!(
                f,
                "application {application_id} not found under master {master_id}"
            ),
            Self::CapacityExceeded(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent provider state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CapacityExceeded(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::MasterNotFound(master_id) => Self::MasterNotFound(master_id),
            RepoError::ApplicationNotFound {
                master_id,
                application_id,
            } => Self::ApplicationNotFound {
                master_id,
                application_id,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CapacityExceeded> for ServiceError {
    fn from(value: CapacityExceeded) -> Self {
        Self::CapacityExceeded(value)
    }
}
