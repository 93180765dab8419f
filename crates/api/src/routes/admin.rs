//! Route definitions for admin listings.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes mounted at `/api/admin`.
///
/// All routes require admin credentials (enforced by handler extractors).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list_jobs", get(admin::list_jobs))
        .route("/list_miners", get(admin::list_miners))
        .route("/reset_job/{id0}", get(admin::reset_job))
}
