use axum::routing::get;
use axum::Router;

use crate::handlers::downloads;
use crate::state::AppState;

/// Mount the movable download route (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/download_movable/{id0}", get(downloads::download_movable))
}
