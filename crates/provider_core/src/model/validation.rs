//! Field validation shared by master and application models.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Input rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Master name is blank after normalization.
    EmptyName,
    /// Application address is blank after normalization.
    EmptyAddress,
    /// Application complexity is below zero.
    NegativeComplexity(i64),
    /// Master capacity ceiling is below zero.
    NegativeMaxComplexity(i64),
    /// Transfer source and destination are the same master.
    SameMaster,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "master name must not be blank"),
            Self::EmptyAddress => write!(f, "application address must not be blank"),
            Self::NegativeComplexity(value) => {
                write!(f, "complexity must be >= 0, got {value}")
            }
            Self::NegativeMaxComplexity(value) => {
                write!(f, "max complexity must be >= 0, got {value}")
            }
            Self::SameMaster => {
                write!(f, "transfer source and destination must be different masters")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims and collapses internal whitespace runs into a single space.
///
/// Returns `None` when nothing remains.
pub fn normalize_text(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}
