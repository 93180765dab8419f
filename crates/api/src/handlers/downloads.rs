//! Movable download.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use seedpool_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::handlers::parse_id0;
use crate::state::AppState;

/// GET /download_movable/{id0}
///
/// Serves the stored movable as an attachment named `movable.sed`.
pub async fn download_movable(
    State(state): State<AppState>,
    Path(id0): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id0 = parse_id0(&id0)?;
    let movable = state
        .coordinator
        .artifact(&id0)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Movable",
                id: id0.to_string(),
            })
        })?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream"),
            (CONTENT_DISPOSITION, "attachment; filename=\"movable.sed\""),
        ],
        movable,
    ))
}
