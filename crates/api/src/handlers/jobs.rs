//! Handlers for job submission and the miner polling protocol.
//!
//! Miners call `request_job`, then `update_job` periodically while they
//! work, and finally `complete_job` with the movable. Submitters poll
//! `check_job_status` and may `cancel_job`.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use seedpool_core::error::CoreError;
use seedpool_core::job::{JobDescriptor, JobStatus};
use seedpool_core::mii::MiiUpload;
use seedpool_core::stats::NetworkStats;
use seedpool_core::submission::{
    normalize_mii_submission, normalize_part1_submission, SubmissionFields,
};
use seedpool_core::table::HeartbeatOutcome;

use crate::error::{AppError, AppResult};
use crate::handlers::parse_id0;
use crate::middleware::client_addr::ClientAddr;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the mii file or QR image.
const MII_FILE_FIELD: &str = "mii_file";

#[derive(Debug, Serialize)]
pub struct SubmittedJob {
    pub id0: String,
}

#[derive(Debug, Serialize)]
pub struct JobStatusBody {
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
pub struct RequestJobParams {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    /// Base64-encoded movable.
    pub movable: String,
}

// ---------------------------------------------------------------------------
// Submission body parsing
// ---------------------------------------------------------------------------

/// Read submission fields from a JSON, urlencoded or multipart body.
async fn read_submission(
    request: Request,
    state: &AppState,
) -> AppResult<(SubmissionFields, Option<MiiUpload>)> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return read_multipart(multipart).await;
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(form) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let mut fields = SubmissionFields::default();
        for (name, value) in form {
            fields.set_form_field(&name, value);
        }
        return Ok((fields, None));
    }

    let Json(body) = Json::<serde_json::Value>::from_request(request, state)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let fields = SubmissionFields::from_json(&body).map_err(CoreError::from)?;
    Ok((fields, None))
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<(SubmissionFields, Option<MiiUpload>)> {
    let mut fields = SubmissionFields::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == MII_FILE_FIELD {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            upload = Some(MiiUpload {
                filename,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.set_form_field(&name, text);
        }
    }

    Ok((fields, upload))
}

// ---------------------------------------------------------------------------
// POST /api/submit_mii_job
// ---------------------------------------------------------------------------

/// Submit a full mii job as JSON or as a form with an optional `mii_file`.
pub async fn submit_mii_job(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Json<DataResponse<SubmittedJob>>> {
    let (fields, upload) = read_submission(request, &state).await?;
    let job = normalize_mii_submission(&fields, upload.as_ref()).map_err(CoreError::from)?;
    let id0 = state.coordinator.submit(job).await;

    Ok(Json(DataResponse::new(SubmittedJob { id0: id0.into() })))
}

// ---------------------------------------------------------------------------
// POST /api/submit_part1_job
// ---------------------------------------------------------------------------

/// Submit a resumed job from a previously computed part1 blob.
pub async fn submit_part1_job(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Json<DataResponse<SubmittedJob>>> {
    let (fields, _) = read_submission(request, &state).await?;
    let job = normalize_part1_submission(&fields).map_err(CoreError::from)?;
    let id0 = state.coordinator.submit(job).await;

    Ok(Json(DataResponse::new(SubmittedJob { id0: id0.into() })))
}

// ---------------------------------------------------------------------------
// GET /api/request_job
// ---------------------------------------------------------------------------

/// Hand the next waiting job to the calling miner, or `null` if none.
pub async fn request_job(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    Query(params): Query<RequestJobParams>,
) -> Json<DataResponse<Option<JobDescriptor>>> {
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| addr.clone());
    tracing::debug!(miner = %name, addr = %addr, "Miner requests work");

    let job = state
        .coordinator
        .request(&name, &addr, params.version.as_deref())
        .await;
    Json(DataResponse::new(job))
}

// ---------------------------------------------------------------------------
// GET /api/check_job_status/{id0}
// ---------------------------------------------------------------------------

pub async fn check_job_status(
    State(state): State<AppState>,
    Path(id0): Path<String>,
) -> AppResult<Json<DataResponse<JobStatusBody>>> {
    let id0 = parse_id0(&id0)?;
    let status = state
        .coordinator
        .status(&id0)
        .await
        .ok_or_else(|| AppError::Core(CoreError::job_not_found(id0.as_str())))?;
    Ok(Json(DataResponse::new(JobStatusBody { status })))
}

// ---------------------------------------------------------------------------
// GET /api/update_job/{id0}
// ---------------------------------------------------------------------------

/// Heartbeat from the miner working on `id0`.
///
/// Returns `null` while the job is still assigned, or `{status}` when the
/// miner should stop.
pub async fn update_job(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    Path(id0): Path<String>,
) -> AppResult<Json<DataResponse<Option<JobStatusBody>>>> {
    let id0 = parse_id0(&id0)?;
    tracing::debug!(id0 = %id0, addr = %addr, "Miner is still mining");

    let data = match state.coordinator.heartbeat(&id0, &addr).await? {
        HeartbeatOutcome::Acknowledged => None,
        HeartbeatOutcome::StatusOverride(status) => Some(JobStatusBody { status }),
    };
    Ok(Json(DataResponse::new(data)))
}

// ---------------------------------------------------------------------------
// GET /api/cancel_job/{id0}
// ---------------------------------------------------------------------------

pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id0): Path<String>,
) -> AppResult<Json<DataResponse<()>>> {
    let id0 = parse_id0(&id0)?;
    state.coordinator.cancel(&id0).await?;
    Ok(Json(DataResponse::ack()))
}

// ---------------------------------------------------------------------------
// POST /api/complete_job/{id0}
// ---------------------------------------------------------------------------

pub async fn complete_job(
    State(state): State<AppState>,
    Path(id0): Path<String>,
    Json(input): Json<CompleteJobRequest>,
) -> AppResult<Json<DataResponse<()>>> {
    let id0 = parse_id0(&id0)?;
    let movable = STANDARD
        .decode(input.movable.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid movable encoding: {e}")))?;

    state.coordinator.complete(&id0, &movable).await?;
    Ok(Json(DataResponse::ack()))
}

// ---------------------------------------------------------------------------
// GET /api/check_network_stats
// ---------------------------------------------------------------------------

pub async fn check_network_stats(State(state): State<AppState>) -> Json<DataResponse<NetworkStats>> {
    Json(DataResponse::new(state.coordinator.stats().await))
}
