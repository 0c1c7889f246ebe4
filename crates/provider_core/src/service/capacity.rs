//! Capacity checks over a loaded master.
//!
//! All math is `i64`; an addition that would overflow counts as exceeding.

use crate::model::application::ApplicationId;
use crate::model::master::{Master, MasterId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A mutation would push a master's assigned total above its ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub master_id: MasterId,
    pub max_complexity: i64,
    /// Assigned total that stays in place if the mutation is applied.
    pub current_total: i64,
    /// Complexity the mutation adds on top of `current_total`.
    pub requested: i64,
}

impl Display for CapacityExceeded {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "master {} capacity exceeded: {} assigned + {} requested > max {}",
            self.master_id, self.current_total, self.requested, self.max_complexity
        )
    }
}

impl Error for CapacityExceeded {}

/// Checks that `incoming` fits under the master's ceiling.
///
/// `excluding` removes one owned application from the baseline, which is how
/// an edit replaces that application's old complexity with the new one.
/// Equality with the ceiling is allowed.
pub fn ensure_fits(
    master: &Master,
    excluding: Option<ApplicationId>,
    incoming: i64,
) -> Result<(), CapacityExceeded> {
    let baseline = master
        .applications
        .iter()
        .filter(|app| Some(app.id) != excluding)
        .fold(0i64, |sum, app| sum.saturating_add(app.complexity.max(0)));

    match baseline.checked_add(incoming) {
        Some(total) if total <= master.max_complexity => Ok(()),
        _ => Err(CapacityExceeded {
            master_id: master.id,
            max_complexity: master.max_complexity,
            current_total: baseline,
            requested: incoming,
        }),
    }
}

/// Checks that a new ceiling still covers what is already assigned.
pub fn ensure_limit_covers(master: &Master, new_max_complexity: i64) -> Result<(), CapacityExceeded> {
    let current_total = master.assigned_total();
    if current_total <= new_max_complexity {
        return Ok(());
    }
    Err(CapacityExceeded {
        master_id: master.id,
        max_complexity: new_max_complexity,
        current_total,
        requested: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::{ensure_fits, ensure_limit_covers};
    use crate::model::application::Application;
    use crate::model::master::Master;
    use uuid::Uuid;

    fn master(max: i64, complexities: &[i64]) -> Master {
        let id = Uuid::new_v4();
        Master {
            id,
            name: "Sidorov".to_string(),
            max_complexity: max,
            applications: complexities
                .iter()
                .map(|&complexity| Application {
                    id: Uuid::new_v4(),
                    master_id: id,
                    address: "Gagarina 7".to_string(),
                    complexity,
                })
                .collect(),
        }
    }

    #[test]
    fn rejects_when_sum_exceeds_ceiling() {
        let m = master(10, &[8]);
        let err = ensure_fits(&m, None, 3).unwrap_err();
        assert_eq!(err.current_total, 8);
        assert_eq!(err.requested, 3);
        assert_eq!(err.max_complexity, 10);
    }

    #[test]
    fn accepts_exact_fill() {
        let m = master(10, &[8]);
        assert!(ensure_fits(&m, None, 2).is_ok());
    }

    #[test]
    fn excluded_application_does_not_count() {
        let m = master(10, &[5, 3]);
        let edited = m.applications[1].id;
        // 5 + 6 = 11 > 10
        assert!(ensure_fits(&m, Some(edited), 6).is_err());
        // 5 + 5 = 10
        assert!(ensure_fits(&m, Some(edited), 5).is_ok());
    }

    #[test]
    fn overflow_is_treated_as_exceeding() {
        let m = master(i64::MAX, &[i64::MAX]);
        assert!(ensure_fits(&m, None, 1).is_err());
    }

    #[test]
    fn zero_complexity_always_fits_a_full_master() {
        let m = master(4, &[4]);
        assert!(ensure_fits(&m, None, 0).is_ok());
    }

    #[test]
    fn limit_must_cover_assigned_total() {
        let m = master(10, &[4, 4]);
        assert!(ensure_limit_covers(&m, 8).is_ok());
        let err = ensure_limit_covers(&m, 7).unwrap_err();
        assert_eq!(err.current_total, 8);
        assert_eq!(err.max_complexity, 7);
    }
}
