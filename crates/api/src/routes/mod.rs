pub mod admin;
pub mod downloads;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /submit_mii_job                  submit a mii job (POST, JSON or form)
/// /submit_part1_job                submit a resumed part1 job (POST)
/// /request_job                     miner asks for work
/// /check_job_status/{id0}          job status
/// /update_job/{id0}                miner heartbeat
/// /cancel_job/{id0}                cancel a job
/// /complete_job/{id0}              upload the movable (POST)
/// /check_network_stats             pool-wide counters
///
/// /admin/list_jobs                 all jobs + queue (basic auth)
/// /admin/list_miners               all miners (basic auth)
/// /admin/reset_job/{id0}           requeue a canceled job (basic auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(jobs::router())
        .nest("/admin", admin::router())
}
