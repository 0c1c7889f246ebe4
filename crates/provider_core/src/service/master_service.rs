//! Master lifecycle use-cases.
//!
//! # Invariants
//! - A master's ceiling is never lowered below its assigned total.
//! - Deleting a master removes its applications in the same transaction.

use super::assignment_service::log_rejection;
use super::capacity::ensure_limit_covers;
use super::{ServiceError, ServiceResult};
use crate::model::master::{Master, MasterDraft, MasterId, DEFAULT_MAX_COMPLEXITY};
use crate::repo::unit_of_work::UnitOfWork;
use log::info;

/// Master lifecycle service facade.
pub struct MasterService<U: UnitOfWork> {
    store: U,
    default_max_complexity: i64,
}

impl<U: UnitOfWork> MasterService<U> {
    pub fn new(store: U) -> Self {
        Self {
            store,
            default_max_complexity: DEFAULT_MAX_COMPLEXITY,
        }
    }

    /// Overrides the ceiling used by `create_master` when none is given.
    pub fn with_default_max_complexity(mut self, value: i64) -> Self {
        self.default_max_complexity = value;
        self
    }

    /// Creates a master with no applications.
    pub fn create_master(&mut self, name: &str, max_complexity: Option<i64>) -> ServiceResult<Master> {
        let draft = MasterDraft::new(
            name,
            max_complexity.unwrap_or(self.default_max_complexity),
        )?;

        let result = self
            .store
            .transaction(|repo| -> ServiceResult<Master> { Ok(repo.create_master(&draft)?) });

        match &result {
            Ok(master) => info!(
                "event=master_create module=service status=ok master_id={} max_complexity={}",
                master.id, master.max_complexity
            ),
            Err(err) => log_rejection("master_create", err),
        }
        result
    }

    /// Updates name and/or ceiling. Omitted fields keep their current value.
    ///
    /// # Errors
    /// - `CapacityExceeded` when the new ceiling is below the assigned total.
    pub fn edit_master(
        &mut self,
        master_id: MasterId,
        name: Option<&str>,
        max_complexity: Option<i64>,
    ) -> ServiceResult<Master> {
        let result = self.store.transaction(|repo| -> ServiceResult<Master> {
            let master = repo
                .find_master_with_applications(master_id)?
                .ok_or(ServiceError::MasterNotFound(master_id))?;
            let draft = MasterDraft::new(
                name.unwrap_or(master.name.as_str()),
                max_complexity.unwrap_or(master.max_complexity),
            )?;
            ensure_limit_covers(&master, draft.max_complexity)?;
            Ok(repo.update_master(master_id, &draft)?)
        });

        match &result {
            Ok(master) => info!(
                "event=master_edit module=service status=ok master_id={} max_complexity={} assigned_total={}",
                master.id,
                master.max_complexity,
                master.assigned_total()
            ),
            Err(err) => log_rejection("master_edit", err),
        }
        result
    }

    /// Deletes a master and all of its applications.
    ///
    /// Returns the number of applications removed.
    pub fn delete_master(&mut self, master_id: MasterId) -> ServiceResult<usize> {
        let result = self
            .store
            .transaction(|repo| -> ServiceResult<usize> { Ok(repo.delete_master(master_id)?) });

        match &result {
            Ok(removed) => info!(
                "event=master_delete module=service status=ok master_id={} removed_applications={}",
                master_id, removed
            ),
            Err(err) => log_rejection("master_delete", err),
        }
        result
    }

    pub fn get_master(&mut self, master_id: MasterId) -> ServiceResult<Master> {
        self.store.transaction(|repo| -> ServiceResult<Master> {
            repo.find_master_with_applications(master_id)?
                .ok_or(ServiceError::MasterNotFound(master_id))
        })
    }

    /// Lists all masters with nested applications in creation order.
    pub fn list_masters(&mut self) -> ServiceResult<Vec<Master>> {
        self.store
            .transaction(|repo| -> ServiceResult<Vec<Master>> {
                Ok(repo.list_masters_with_applications()?)
            })
    }
}
