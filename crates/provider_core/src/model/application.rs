//! Application (work order) model.

use super::master::MasterId;
use super::validation::{normalize_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an application.
pub type ApplicationId = Uuid;

/// One unit of work owned by exactly one master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    /// Current owner. Changes only through a transfer.
    pub master_id: MasterId,
    pub address: String,
    /// Workload cost counted against the owner's capacity.
    pub complexity: i64,
}

/// Validated address/complexity pair ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub address: String,
    pub complexity: i64,
}

impl ApplicationDraft {
    /// Normalizes and validates user input.
    ///
    /// A missing complexity counts as 0.
    pub fn new(address: &str, complexity: Option<i64>) -> Result<Self, ValidationError> {
        let address = normalize_text(address).ok_or(ValidationError::EmptyAddress)?;
        let complexity = complexity.unwrap_or(0);
        if complexity < 0 {
            return Err(ValidationError::NegativeComplexity(complexity));
        }
        Ok(Self {
            address,
            complexity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationDraft;
    use crate::model::ValidationError;

    #[test]
    fn missing_complexity_defaults_to_zero() {
        let draft = ApplicationDraft::new("Main st. 1", None).unwrap();
        assert_eq!(draft.complexity, 0);
    }

    #[test]
    fn rejects_negative_complexity_and_blank_address() {
        assert_eq!(
            ApplicationDraft::new("Main st. 1", Some(-1)).unwrap_err(),
            ValidationError::NegativeComplexity(-1)
        );
        assert_eq!(
            ApplicationDraft::new("   ", Some(1)).unwrap_err(),
            ValidationError::EmptyAddress
        );
    }
}
