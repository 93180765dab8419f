use std::sync::Arc;

use seedpool_core::coordinator::Coordinator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (admin credentials, limits).
    pub config: Arc<ServerConfig>,
    /// The job coordinator. The only owner of job and worker state.
    pub coordinator: Arc<Coordinator>,
}
