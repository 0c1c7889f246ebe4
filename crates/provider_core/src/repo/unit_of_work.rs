//! Transactional unit of work over the provider repository.
//!
//! # Responsibility
//! - Run one capacity check plus its writes as a single atomic step.
//! - Serialize conflicting writers so no check runs against a stale total.
//!
//! # Invariants
//! - Work that returns `Err` leaves storage untouched.
//! - SQLite transactions start `IMMEDIATE`, taking the write lock before the
//!   first read.

use super::provider_repo::{
    ensure_provider_connection_ready, ProviderRepository, RepoError, RepoResult,
    SqliteProviderRepository,
};
use log::warn;
use rusqlite::{Connection, TransactionBehavior};

/// Source of isolated repository transactions.
pub trait UnitOfWork {
    /// Runs `work` inside one transaction.
    ///
    /// Commits when `work` returns `Ok`; rolls back otherwise.
    fn transaction<T, E>(
        &mut self,
        work: impl FnOnce(&dyn ProviderRepository) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>;
}

/// SQLite unit of work borrowing one migrated connection.
pub struct SqliteUnitOfWork<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteUnitOfWork<'conn> {
    /// Constructs a unit of work from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_provider_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
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

        let repo = SqliteProviderRepository::from_ready(&tx);
        let value = match work(&repo) {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=tx_rollback module=repo status=error error={}",
                        rollback_err
                    );
                }
                return Err(err);
            }
        };

        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}
