//! Master/application repository contract and SQLite implementation.
//!
//! # Invariants
//! - Application lookups are always scoped to their owning master.
//! - Listing order is creation order for masters and for applications.
//! - A NULL persisted complexity reads as 0.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::application::{Application, ApplicationDraft, ApplicationId};
use crate::model::master::{Master, MasterDraft, MasterId};
use rusqlite::{params, Connection, OptionalExtension, Row, Rows};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MASTER_JOIN_SELECT_SQL: &str = "SELECT
    m.id AS master_id,
    m.name AS master_name,
    m.max_complexity AS max_complexity,
    a.id AS application_id,
    a.address AS address,
    a.complexity AS complexity
FROM masters m
LEFT JOIN applications a ON a.master_id = m.id";

const MASTER_JOIN_ORDER_SQL: &str =
    "ORDER BY m.created_at ASC, m.rowid ASC, a.created_at ASC, a.rowid ASC";

const APPLICATION_SELECT_SQL: &str = "SELECT
    id,
    master_id,
    address,
    complexity
FROM applications";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for provider persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    MasterNotFound(MasterId),
    /// Application does not exist or is owned by a different master.
    ApplicationNotFound {
        master_id: MasterId,
        application_id: ApplicationId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MasterNotFound(id) => write!(f, "master not found: {id}"),
            Self::ApplicationNotFound {
                master_id,
                application_id,
            } => write!(
                f,
                "application {application_id} not found under master {master_id}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "provider repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted provider data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for master/application rows.
pub trait ProviderRepository {
    /// Loads one master with all of its applications.
    fn find_master_with_applications(&self, master_id: MasterId) -> RepoResult<Option<Master>>;
    /// Lists every master with nested applications, including empty masters.
    fn list_masters_with_applications(&self) -> RepoResult<Vec<Master>>;
    fn create_master(&self, draft: &MasterDraft) -> RepoResult<Master>;
    fn update_master(&self, master_id: MasterId, draft: &MasterDraft) -> RepoResult<Master>;
    /// Deletes the master's applications, then the master.
    ///
    /// Returns the number of applications removed.
    fn delete_master(&self, master_id: MasterId) -> RepoResult<usize>;
    fn create_application(
        &self,
        master_id: MasterId,
        draft: &ApplicationDraft,
    ) -> RepoResult<Application>;
    fn update_application(
        &self,
        master_id: MasterId,
        application_id: ApplicationId,
        draft: &ApplicationDraft,
    ) -> RepoResult<Application>;
    /// Deletes one owned application and returns the removed row.
    fn delete_application(
        &self,
        master_id: MasterId,
        application_id: ApplicationId,
    ) -> RepoResult<Application>;
    /// Changes the owner of one application in place.
    fn reassign_application(
        &self,
        application_id: ApplicationId,
        from_master_id: MasterId,
        to_master_id: MasterId,
    ) -> RepoResult<Application>;
}

/// SQLite-backed provider repository.
pub struct SqliteProviderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProviderRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_provider_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already checked by the caller.
    pub(crate) fn from_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProviderRepository for SqliteProviderRepository<'_> {
    fn find_master_with_applications(&self, master_id: MasterId) -> RepoResult<Option<Master>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MASTER_JOIN_SELECT_SQL}
             WHERE m.id = ?1
             {MASTER_JOIN_ORDER_SQL};"
        ))?;
        let rows = stmt.query([master_id.to_string()])?;
        Ok(collect_masters(rows)?.into_iter().next())
    }

    fn list_masters_with_applications(&self) -> RepoResult<Vec<Master>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MASTER_JOIN_SELECT_SQL} {MASTER_JOIN_ORDER_SQL};"))?;
        let rows = stmt.query([])?;
        collect_masters(rows)
    }

    fn create_master(&self, draft: &MasterDraft) -> RepoResult<Master> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO masters (id, name, max_complexity) VALUES (?1, ?2, ?3);",
            params![id.to_string(), draft.name.as_str(), draft.max_complexity],
        )?;

        Ok(Master {
            id,
            name: draft.name.clone(),
            max_complexity: draft.max_complexity,
            applications: Vec::new(),
        })
    }

    fn update_master(&self, master_id: MasterId, draft: &MasterDraft) -> RepoResult<Master> {
        let changed = self.conn.execute(
            "UPDATE masters
             SET
                name = ?2,
                max_complexity = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                master_id.to_string(),
                draft.name.as_str(),
                draft.max_complexity
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::MasterNotFound(master_id));
        }

        self.find_master_with_applications(master_id)?
            .ok_or(RepoError::MasterNotFound(master_id))
    }

    fn delete_master(&self, master_id: MasterId) -> RepoResult<usize> {
        let master_id_text = master_id.to_string();
        let removed = self.conn.execute(
            "DELETE FROM applications WHERE master_id = ?1;",
            [master_id_text.as_str()],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM masters WHERE id = ?1;", [master_id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::MasterNotFound(master_id));
        }
        Ok(removed)
    }

    fn create_application(
        &self,
        master_id: MasterId,
        draft: &ApplicationDraft,
    ) -> RepoResult<Application> {
        if !master_exists(self.conn, master_id)? {
            return Err(RepoError::MasterNotFound(master_id));
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO applications (id, master_id, address, complexity)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                master_id.to_string(),
                draft.address.as_str(),
                draft.complexity,
            ],
        )?;

        Ok(Application {
            id,
            master_id,
            address: draft.address.clone(),
            complexity: draft.complexity,
        })
    }

    fn update_application(
        &self,
        master_id: MasterId,
        application_id: ApplicationId,
        draft: &ApplicationDraft,
    ) -> RepoResult<Application> {
        let changed = self.conn.execute(
            "UPDATE applications
             SET
                address = ?3,
                complexity = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND master_id = ?2;",
            params![
                application_id.to_string(),
                master_id.to_string(),
                draft.address.as_str(),
                draft.complexity,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ApplicationNotFound {
                master_id,
                application_id,
            });
        }

        load_owned_application(self.conn, master_id, application_id)
    }

    fn delete_application(
        &self,
        master_id: MasterId,
        application_id: ApplicationId,
    ) -> RepoResult<Application> {
        let existing = load_owned_application(self.conn, master_id, application_id)?;
        self.conn.execute(
            "DELETE FROM applications WHERE id = ?1 AND master_id = ?2;",
            params![application_id.to_string(), master_id.to_string()],
        )?;
        Ok(existing)
    }

    fn reassign_application(
        &self,
        application_id: ApplicationId,
        from_master_id: MasterId,
        to_master_id: MasterId,
    ) -> RepoResult<Application> {
        if !master_exists(self.conn, to_master_id)? {
            return Err(RepoError::MasterNotFound(to_master_id));
        }

        let changed = self.conn.execute(
            "UPDATE applications
             SET
                master_id = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND master_id = ?2;",
            params![
                application_id.to_string(),
                from_master_id.to_string(),
                to_master_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ApplicationNotFound {
                master_id: from_master_id,
                application_id,
            });
        }

        load_owned_application(self.conn, to_master_id, application_id)
    }
}

/// Groups joined master/application rows into masters, preserving row order.
fn collect_masters(mut rows: Rows<'_>) -> RepoResult<Vec<Master>> {
    let mut masters: Vec<Master> = Vec::new();
    while let Some(row) = rows.next()? {
        let master_id = parse_uuid(&row.get::<_, String>("master_id")?, "masters.id")?;

        let is_new_master = masters.last().map_or(true, |last| last.id != master_id);
        if is_new_master {
            let max_complexity: i64 = row.get("max_complexity")?;
            if max_complexity < 0 {
                return Err(RepoError::InvalidData(format!(
                    "negative max_complexity `{max_complexity}` in masters.max_complexity"
                )));
            }
            masters.push(Master {
                id: master_id,
                name: row.get("master_name")?,
                max_complexity,
                applications: Vec::new(),
            });
        }

        let Some(application_id) = row.get::<_, Option<String>>("application_id")? else {
            continue;
        };
        let application = Application {
            id: parse_uuid(&application_id, "applications.id")?,
            master_id,
            address: row.get("address")?,
            complexity: parse_complexity(row)?,
        };
        if let Some(master) = masters.last_mut() {
            master.applications.push(application);
        }
    }
    Ok(masters)
}

fn load_owned_application(
    conn: &Connection,
    master_id: MasterId,
    application_id: ApplicationId,
) -> RepoResult<Application> {
    let mut stmt = conn.prepare(&format!(
        "{APPLICATION_SELECT_SQL}
         WHERE id = ?1
           AND master_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![application_id.to_string(), master_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_application_row(row);
    }
    Err(RepoError::ApplicationNotFound {
        master_id,
        application_id,
    })
}

fn parse_application_row(row: &Row<'_>) -> RepoResult<Application> {
    Ok(Application {
        id: parse_uuid(&row.get::<_, String>("id")?, "applications.id")?,
        master_id: parse_uuid(
            &row.get::<_, String>("master_id")?,
            "applications.master_id",
        )?,
        address: row.get("address")?,
        complexity: parse_complexity(row)?,
    })
}

fn parse_complexity(row: &Row<'_>) -> RepoResult<i64> {
    match row.get::<_, Option<i64>>("complexity")? {
        None => Ok(0),
        Some(value) if value < 0 => Err(RepoError::InvalidData(format!(
            "negative complexity `{value}` in applications.complexity"
        ))),
        Some(value) => Ok(value),
    }
}

fn master_exists(conn: &Connection, master_id: MasterId) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM masters WHERE id = ?1;",
            [master_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn ensure_provider_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
