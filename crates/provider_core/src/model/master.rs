//! Master (worker) model and capacity accounting.
//!
//! # Invariants
//! - `assigned_total() <= max_complexity` after every committed mutation.
//! - `applications` order is display-only.

use super::application::{Application, ApplicationId};
use super::validation::{normalize_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a master.
pub type MasterId = Uuid;

/// Capacity ceiling assigned to masters created without an explicit value.
pub const DEFAULT_MAX_COMPLEXITY: i64 = 10;

/// Worker with a capacity ceiling and the applications assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Master {
    pub id: MasterId,
    pub name: String,
    pub max_complexity: i64,
    pub applications: Vec<Application>,
}

impl Master {
    /// Sum of assigned application complexities.
    ///
    /// Saturates instead of overflowing so a corrupt row cannot wrap the
    /// total back under the ceiling.
    pub fn assigned_total(&self) -> i64 {
        self.applications
            .iter()
            .fold(0i64, |sum, app| sum.saturating_add(app.complexity.max(0)))
    }

    /// Capacity left before the ceiling is reached. Negative when over.
    pub fn remaining_capacity(&self) -> i64 {
        self.max_complexity.saturating_sub(self.assigned_total())
    }

    pub fn is_over_capacity(&self) -> bool {
        self.assigned_total() > self.max_complexity
    }

    /// Finds an owned application by id.
    pub fn application(&self, id: ApplicationId) -> Option<&Application> {
        self.applications.iter().find(|app| app.id == id)
    }
}

/// Validated master configuration ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterDraft {
    pub name: String,
    pub max_complexity: i64,
}

impl MasterDraft {
    pub fn new(name: &str, max_complexity: i64) -> Result<Self, ValidationError> {
        let name = normalize_text(name).ok_or(ValidationError::EmptyName)?;
        if max_complexity < 0 {
            return Err(ValidationError::NegativeMaxComplexity(max_complexity));
        }
        Ok(Self {
            name,
            max_complexity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Master, MasterDraft};
    use crate::model::application::Application;
    use crate::model::ValidationError;
    use uuid::Uuid;

    fn master_with(max: i64, complexities: &[i64]) -> Master {
        let id = Uuid::new_v4();
        Master {
            id,
            name: "Ivanov".to_string(),
            max_complexity: max,
            applications: complexities
                .iter()
                .map(|complexity| Application {
                    id: Uuid::new_v4(),
                    master_id: id,
                    address: "somewhere".to_string(),
                    complexity: *complexity,
                })
                .collect(),
        }
    }

    #[test]
    fn totals_and_remaining_capacity() {
        let master = master_with(10, &[3, 5]);
        assert_eq!(master.assigned_total(), 8);
        assert_eq!(master.remaining_capacity(), 2);
        assert!(!master.is_over_capacity());
    }

    #[test]
    fn empty_master_has_zero_total() {
        let master = master_with(0, &[]);
        assert_eq!(master.assigned_total(), 0);
        assert!(!master.is_over_capacity());
    }

    #[test]
    fn draft_rejects_negative_ceiling() {
        assert_eq!(
            MasterDraft::new("Petrov", -3).unwrap_err(),
            ValidationError::NegativeMaxComplexity(-3)
        );
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let master = master_with(7, &[2]);
        let value = serde_json::to_value(&master).unwrap();

        assert_eq!(value["maxComplexity"], 7);
        assert_eq!(value["applications"][0]["masterId"], master.id.to_string());
        assert_eq!(value["applications"][0]["complexity"], 2);
    }
}
