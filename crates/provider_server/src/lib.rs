//! HTTP transport for the provider-management core.
//!
//! # Responsibility
//! - Expose master/application use-cases as JSON endpoints.
//! - Normalize every failure into one structured error body.
//!
//! # Invariants
//! - Handlers never make capacity decisions; the core services do.
//! - Storage work runs on the blocking pool, never on async workers.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

pub use config::{ConfigError, ServerArgs, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

/// Builds the application router over shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/masters", get(api::list_masters).post(api::create_master))
        .route(
            "/masters/:master_id",
            get(api::get_master)
                .put(api::edit_master)
                .delete(api::delete_master),
        )
        .route("/masters/:master_id/applications", post(api::add_application))
        .route(
            "/masters/:master_id/applications/:application_id",
            put(api::edit_application).delete(api::delete_application),
        )
        .route(
            "/masters/:master_id/applications/:application_id/transfer",
            post(api::transfer_application),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
