//! Route definitions for job submission and the miner protocol.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Public routes mounted at `/api`.
///
/// These endpoints are unauthenticated; miners and submitters call them.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit_mii_job", post(jobs::submit_mii_job))
        .route("/submit_part1_job", post(jobs::submit_part1_job))
        .route("/request_job", get(jobs::request_job))
        .route("/check_job_status/{id0}", get(jobs::check_job_status))
        .route("/update_job/{id0}", get(jobs::update_job))
        .route("/cancel_job/{id0}", get(jobs::cancel_job))
        .route("/complete_job/{id0}", post(jobs::complete_job))
        .route("/check_network_stats", get(jobs::check_network_stats))
}
