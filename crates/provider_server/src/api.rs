//! JSON endpoints for masters and applications.
//!
//! # Invariants
//! - Each mutating request runs as one unit of work in the core.
//! - Malformed identifiers are reported as not found; malformed bodies as
//!   validation failures.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use provider_core::{
    Application, AssignmentService, Master, MasterService, SqliteUnitOfWork,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Master with its applications and current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterView {
    pub id: Uuid,
    pub name: String,
    pub max_complexity: i64,
    pub assigned_complexity: i64,
    pub applications: Vec<Application>,
}

impl From<Master> for MasterView {
    fn from(master: Master) -> Self {
        Self {
            assigned_complexity: master.assigned_total(),
            id: master.id,
            name: master.name,
            max_complexity: master.max_complexity,
            applications: master.applications,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMasterRequest {
    pub name: String,
    #[serde(default, alias = "max_complexity")]
    pub max_complexity: Option<i64>,
}

/// Partial master update; omitted fields keep their value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMasterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "max_complexity")]
    pub max_complexity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub address: String,
    #[serde(default)]
    pub complexity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(alias = "to_master_id")]
    pub to_master_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMasterResponse {
    pub message: String,
    pub deleted_applications: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteApplicationResponse {
    pub message: String,
    /// Complexity freed on the former owner.
    pub complexity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: provider_core::ping().to_string(),
        version: provider_core::core_version().to_string(),
    })
}

pub async fn list_masters(State(state): State<AppState>) -> Result<Json<Vec<MasterView>>, ApiError> {
    let masters = state
        .run(|conn| masters(conn)?.list_masters())
        .await?;
    Ok(Json(masters.into_iter().map(MasterView::from).collect()))
}

pub async fn get_master(
    State(state): State<AppState>,
    Path(master_id): Path<String>,
) -> Result<Json<MasterView>, ApiError> {
    let master_id = parse_id(&master_id, "master")?;
    let master = state
        .run(move |conn| masters(conn)?.get_master(master_id))
        .await?;
    Ok(Json(master.into()))
}

pub async fn create_master(
    State(state): State<AppState>,
    payload: Result<Json<CreateMasterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MasterView>), ApiError> {
    let Json(request) = payload.map_err(reject_body)?;
    let default_max = state.default_max_complexity();
    let master = state
        .run(move |conn| {
            masters(conn)?
                .with_default_max_complexity(default_max)
                .create_master(&request.name, request.max_complexity)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(master.into())))
}

pub async fn edit_master(
    State(state): State<AppState>,
    Path(master_id): Path<String>,
    payload: Result<Json<EditMasterRequest>, JsonRejection>,
) -> Result<Json<MasterView>, ApiError> {
    let master_id = parse_id(&master_id, "master")?;
    let Json(request) = payload.map_err(reject_body)?;
    let master = state
        .run(move |conn| {
            masters(conn)?.edit_master(
                master_id,
                request.name.as_deref(),
                request.max_complexity,
            )
        })
        .await?;
    Ok(Json(master.into()))
}

pub async fn delete_master(
    State(state): State<AppState>,
    Path(master_id): Path<String>,
) -> Result<Json<DeleteMasterResponse>, ApiError> {
    let master_id = parse_id(&master_id, "master")?;
    let removed = state
        .run(move |conn| masters(conn)?.delete_master(master_id))
        .await?;
    Ok(Json(DeleteMasterResponse {
        message: format!("master {master_id} deleted"),
        deleted_applications: removed,
    }))
}

pub async fn add_application(
    State(state): State<AppState>,
    Path(master_id): Path<String>,
    payload: Result<Json<ApplicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Application>), ApiError> {
    let master_id = parse_id(&master_id, "master")?;
    let Json(request) = payload.map_err(reject_body)?;
    let application = state
        .run(move |conn| {
            assignments(conn)?.add_application(master_id, &request.address, request.complexity)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn edit_application(
    State(state): State<AppState>,
    Path((master_id, application_id)): Path<(String, String)>,
    payload: Result<Json<ApplicationRequest>, JsonRejection>,
) -> Result<Json<Application>, ApiError> {
    let master_id = parse_id(&master_id, "master")?;
    let application_id = parse_id(&application_id, "application")?;
    let Json(request) = payload.map_err(reject_body)?;
    let application = state
        .run(move |conn| {
            assignments(conn)?.edit_application(
                master_id,
                application_id,
                &request.address,
                request.complexity,
            )
        })
        .await?;
    Ok(Json(application))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Path((master_id, application_id)): Path<(String, String)>,
) -> Result<Json<DeleteApplicationResponse>, ApiError> {
    let master_id = parse_id(&master_id, "master")?;
    let application_id = parse_id(&application_id, "application")?;
    let removed = state
        .run(move |conn| assignments(conn)?.delete_application(master_id, application_id))
        .await?;
    Ok(Json(DeleteApplicationResponse {
        message: format!("application {} deleted", removed.id),
        complexity: removed.complexity,
    }))
}

pub async fn transfer_application(
    State(state): State<AppState>,
    Path((master_id, application_id)): Path<(String, String)>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<Application>, ApiError> {
    let from_master_id = parse_id(&master_id, "master")?;
    let application_id = parse_id(&application_id, "application")?;
    let Json(request) = payload.map_err(reject_body)?;
    let to_master_id = parse_id(&request.to_master_id, "destination master")?;
    let application = state
        .run(move |conn| {
            assignments(conn)?.transfer_application(from_master_id, to_master_id, application_id)
        })
        .await?;
    Ok(Json(application))
}

fn masters(
    conn: &mut Connection,
) -> Result<MasterService<SqliteUnitOfWork<'_>>, provider_core::ServiceError> {
    Ok(MasterService::new(SqliteUnitOfWork::try_new(conn)?))
}

fn assignments(
    conn: &mut Connection,
) -> Result<AssignmentService<SqliteUnitOfWork<'_>>, provider_core::ServiceError> {
    Ok(AssignmentService::new(SqliteUnitOfWork::try_new(conn)?))
}

fn parse_id(value: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::not_found(format!("{what} not found: {value}")))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}
