//! Shared handler state.

use crate::error::ApiError;
use provider_core::{ServiceResult, DEFAULT_MAX_COMPLEXITY};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Connection handle and defaults shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    default_max_complexity: i64,
}

impl AppState {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection, default_max_complexity: i64) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            default_max_complexity,
        }
    }

    pub fn with_defaults(conn: Connection) -> Self {
        Self::new(conn, DEFAULT_MAX_COMPLEXITY)
    }

    pub fn default_max_complexity(&self) -> i64 {
        self.default_max_complexity
    }

    /// Runs one storage operation on the blocking pool with exclusive access
    /// to the connection.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Connection) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|_| ApiError::internal("database lock poisoned"))?;
            op(&mut conn).map_err(ApiError::from)
        })
        .await
        .map_err(|err| ApiError::internal(format!("storage task failed: {err}")))?
    }
}
