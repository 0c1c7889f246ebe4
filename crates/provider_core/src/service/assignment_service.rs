//! Capacity-constrained application assignment.
//!
//! # Responsibility
//! - Add, edit, delete, and transfer applications under the capacity
//!   invariant.
//!
//! # Invariants
//! - `assigned_total(master) <= master.max_complexity` for every master
//!   touched by a committed operation.
//! - A transfer commits only when the application is owned by the
//!   destination and no longer by the source.

use super::capacity::ensure_fits;
use super::{ServiceError, ServiceResult};
use crate::model::application::{Application, ApplicationDraft, ApplicationId};
use crate::model::master::MasterId;
use crate::model::ValidationError;
use crate::repo::unit_of_work::UnitOfWork;
use log::{info, warn};

/// Use-case service for application mutations.
pub struct AssignmentService<U: UnitOfWork> {
    store: U,
}

impl<U: UnitOfWork> AssignmentService<U> {
    pub fn new(store: U) -> Self {
        Self { store }
    }

    /// Creates an application owned by `master_id`.
    ///
    /// # Errors
    /// - `Validation` for a blank address or negative complexity.
    /// - `MasterNotFound` when the master does not exist.
    /// - `CapacityExceeded` when `total + complexity > max`.
    pub fn add_application(
        &mut self,
        master_id: MasterId,
        address: &str,
        complexity: Option<i64>,
    ) -> ServiceResult<Application> {
        let draft = ApplicationDraft::new(address, complexity)?;

        let result = self
            .store
            .transaction(|repo| -> ServiceResult<Application> {
                let master = repo
                    .find_master_with_applications(master_id)?
                    .ok_or(ServiceError::MasterNotFound(master_id))?;
                ensure_fits(&master, None, draft.complexity)?;
                Ok(repo.create_application(master_id, &draft)?)
            });

        match &result {
            Ok(app) => info!(
                "event=application_add module=service status=ok master_id={} application_id={} complexity={}",
                master_id, app.id, app.complexity
            ),
            Err(err) => log_rejection("application_add", err),
        }
        result
    }

    /// Replaces address and complexity of an owned application.
    ///
    /// The capacity check excludes the application's old complexity. An
    /// omitted complexity keeps the stored value. All-or-nothing: a rejected
    /// edit leaves the address unchanged too.
    pub fn edit_application(
        &mut self,
        master_id: MasterId,
        application_id: ApplicationId,
        address: &str,
        complexity: Option<i64>,
    ) -> ServiceResult<Application> {
        let result = self
            .store
            .transaction(|repo| -> ServiceResult<Application> {
                let master = repo
                    .find_master_with_applications(master_id)?
                    .ok_or(ServiceError::MasterNotFound(master_id))?;
                let existing =
                    master
                        .application(application_id)
                        .ok_or(ServiceError::ApplicationNotFound {
                            master_id,
                            application_id,
                        })?;

                let draft =
                    ApplicationDraft::new(address, Some(complexity.unwrap_or(existing.complexity)))?;
                ensure_fits(&master, Some(application_id), draft.complexity)?;
                Ok(repo.update_application(master_id, application_id, &draft)?)
            });

        match &result {
            Ok(app) => info!(
                "event=application_edit module=service status=ok master_id={} application_id={} complexity={}",
                master_id, app.id, app.complexity
            ),
            Err(err) => log_rejection("application_edit", err),
        }
        result
    }

    /// Deletes an owned application and returns the removed row.
    ///
    /// No capacity check; deletion only frees capacity.
    pub fn delete_application(
        &mut self,
        master_id: MasterId,
        application_id: ApplicationId,
    ) -> ServiceResult<Application> {
        let result = self
            .store
            .transaction(|repo| -> ServiceResult<Application> {
                Ok(repo.delete_application(master_id, application_id)?)
            });

        match &result {
            Ok(app) => info!(
                "event=application_delete module=service status=ok master_id={} application_id={} freed_complexity={}",
                master_id, app.id, app.complexity
            ),
            Err(err) => log_rejection("application_delete", err),
        }
        result
    }

    /// Moves ownership of an application from one master to another.
    ///
    /// The destination's capacity is checked against its persisted state
    /// before any write. After the owner change, both masters are re-read and
    /// the transaction is aborted unless the application is owned by the
    /// destination only and the destination is within capacity.
    pub fn transfer_application(
        &mut self,
        from_master_id: MasterId,
        to_master_id: MasterId,
        application_id: ApplicationId,
    ) -> ServiceResult<Application> {
        if from_master_id == to_master_id {
            return Err(ValidationError::SameMaster.into());
        }

        let result = self
            .store
            .transaction(|repo| -> ServiceResult<Application> {
                let source = repo
                    .find_master_with_applications(from_master_id)?
                    .ok_or(ServiceError::MasterNotFound(from_master_id))?;
                let application = source.application(application_id).cloned().ok_or(
                    ServiceError::ApplicationNotFound {
                        master_id: from_master_id,
                        application_id,
                    },
                )?;
                let destination = repo
                    .find_master_with_applications(to_master_id)?
                    .ok_or(ServiceError::MasterNotFound(to_master_id))?;
                ensure_fits(&destination, None, application.complexity)?;

                let moved =
                    repo.reassign_application(application_id, from_master_id, to_master_id)?;

                let source_after = repo
                    .find_master_with_applications(from_master_id)?
                    .ok_or(ServiceError::InconsistentState("transfer source vanished"))?;
                let destination_after = repo
                    .find_master_with_applications(to_master_id)?
                    .ok_or(ServiceError::InconsistentState("transfer destination vanished"))?;

                if source_after.application(application_id).is_some() {
                    return Err(ServiceError::InconsistentState(
                        "application still owned by transfer source",
                    ));
                }
                if destination_after.application(application_id).is_none() {
                    return Err(ServiceError::InconsistentState(
                        "application missing from transfer destination",
                    ));
                }
                if destination_after.is_over_capacity() {
                    return Err(ServiceError::InconsistentState(
                        "transfer destination over capacity after write",
                    ));
                }
                Ok(moved)
            });

        match &result {
            Ok(app) => info!(
                "event=application_transfer module=service status=ok from_master_id={} to_master_id={} application_id={} complexity={}",
                from_master_id, to_master_id, app.id, app.complexity
            ),
            Err(err) => log_rejection("application_transfer", err),
        }
        result
    }
}

pub(crate) fn log_rejection(event: &str, err: &ServiceError) {
    match err {
        ServiceError::InconsistentState(_) | ServiceError::Repo(_) => log::error!(
            "event={event} module=service status=error error_kind={} error={}",
            err.kind().as_str(),
            err
        ),
        _ => warn!(
            "event={event} module=service status=rejected error_kind={}",
            err.kind().as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::AssignmentService;
    use crate::db::open_db_in_memory;
    use crate::model::application::{Application, ApplicationDraft, ApplicationId};
    use crate::model::master::{Master, MasterDraft, MasterId};
    use crate::repo::provider_repo::{
        ProviderRepository, RepoError, RepoResult, SqliteProviderRepository,
    };
    use crate::repo::unit_of_work::UnitOfWork;
    use crate::service::ServiceError;
    use rusqlite::{Connection, TransactionBehavior};

    /// Simulates a transfer whose insert into the destination succeeds but
    /// whose removal from the source silently does nothing.
    struct InsertWithoutDelete<'a> {
        inner: SqliteProviderRepository<'a>,
    }

    impl ProviderRepository for InsertWithoutDelete<'_> {
        fn find_master_with_applications(&self, id: MasterId) -> RepoResult<Option<Master>> {
            self.inner.find_master_with_applications(id)
        }
        fn list_masters_with_applications(&self) -> RepoResult<Vec<Master>> {
            self.inner.list_masters_with_applications()
        }
        fn create_master(&self, draft: &MasterDraft) -> RepoResult<Master> {
            self.inner.create_master(draft)
        }
        fn update_master(&self, id: MasterId, draft: &MasterDraft) -> RepoResult<Master> {
            self.inner.update_master(id, draft)
        }
        fn delete_master(&self, id: MasterId) -> RepoResult<usize> {
            self.inner.delete_master(id)
        }
        fn create_application(
            &self,
            master_id: MasterId,
            draft: &ApplicationDraft,
        ) -> RepoResult<Application> {
            self.inner.create_application(master_id, draft)
        }
        fn update_application(
            &self,
            master_id: MasterId,
            application_id: ApplicationId,
            draft: &ApplicationDraft,
        ) -> RepoResult<Application> {
            self.inner
                .update_application(master_id, application_id, draft)
        }
        fn delete_application(
            &self,
            master_id: MasterId,
            application_id: ApplicationId,
        ) -> RepoResult<Application> {
            self.inner.delete_application(master_id, application_id)
        }
        fn reassign_application(
            &self,
            application_id: ApplicationId,
            from_master_id: MasterId,
            to_master_id: MasterId,
        ) -> RepoResult<Application> {
            let source = self
                .inner
                .find_master_with_applications(from_master_id)?
                .ok_or(RepoError::MasterNotFound(from_master_id))?;
            let original = source
                .application(application_id)
                .ok_or(RepoError::ApplicationNotFound {
                    master_id: from_master_id,
                    application_id,
                })?;
            let draft = ApplicationDraft::new(&original.address, Some(original.complexity))
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
            self.inner.create_application(to_master_id, &draft)
        }
    }

    struct FaultyUnitOfWork {
        conn: Connection,
    }

    impl UnitOfWork for FaultyUnitOfWork {
        fn transaction<T, E>(
            &mut self,
            work: impl FnOnce(&dyn ProviderRepository) -> Result<T, E>,
        ) -> Result<T, E>
        where
            E: From<RepoError>,
        {
            let tx = self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(RepoError::from)?;
            let repo = InsertWithoutDelete {
                inner: SqliteProviderRepository::try_new(&tx)?,
            };
            let value = work(&repo)?;
            tx.commit().map_err(RepoError::from)?;
            Ok(value)
        }
    }

    #[test]
    fn transfer_with_lost_source_delete_fails_loudly_and_rolls_back() {
        let conn = open_db_in_memory().unwrap();
        let (from_id, to_id, app_id) = {
            let repo = SqliteProviderRepository::try_new(&conn).unwrap();
            let from = repo
                .create_master(&MasterDraft::new("Source", 10).unwrap())
                .unwrap();
            let to = repo
                .create_master(&MasterDraft::new("Target", 10).unwrap())
                .unwrap();
            let app = repo
                .create_application(from.id, &ApplicationDraft::new("Lenina 1", Some(4)).unwrap())
                .unwrap();
            (from.id, to.id, app.id)
        };

        let mut service = AssignmentService::new(FaultyUnitOfWork { conn });
        let err = service
            .transfer_application(from_id, to_id, app_id)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InconsistentState(_)));

        let conn = service.store.conn;
        let repo = SqliteProviderRepository::try_new(&conn).unwrap();
        let from = repo.find_master_with_applications(from_id).unwrap().unwrap();
        let to = repo.find_master_with_applications(to_id).unwrap().unwrap();
        assert_eq!(from.assigned_total(), 4);
        assert!(from.application(app_id).is_some());
        assert!(to.applications.is_empty());
    }
}
