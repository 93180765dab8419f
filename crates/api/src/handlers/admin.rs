//! Admin views over the job table. All endpoints require basic auth.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use seedpool_core::job::Worker;
use seedpool_core::table::JobsSnapshot;

use crate::error::AppResult;
use crate::handlers::parse_id0;
use crate::middleware::admin::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MinersList {
    pub miners: Vec<Worker>,
}

/// GET /api/admin/list_jobs -- every job plus the queue order.
pub async fn list_jobs(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Json<DataResponse<JobsSnapshot>> {
    Json(DataResponse::new(state.coordinator.list_jobs().await))
}

/// GET /api/admin/list_miners -- every worker ever seen.
pub async fn list_miners(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Json<DataResponse<MinersList>> {
    Json(DataResponse::new(MinersList {
        miners: state.coordinator.list_workers().await,
    }))
}

/// GET /api/admin/reset_job/{id0} -- put a canceled job back in the queue.
pub async fn reset_job(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id0): Path<String>,
) -> AppResult<Json<DataResponse<()>>> {
    let id0 = parse_id0(&id0)?;
    state.coordinator.reset(&id0).await?;
    Ok(Json(DataResponse::ack()))
}
