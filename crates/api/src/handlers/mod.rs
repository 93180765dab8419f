pub mod admin;
pub mod downloads;
pub mod jobs;

use seedpool_core::id0::Id0;

use crate::error::{AppError, AppResult};

/// Validate an id0 path segment before it reaches the coordinator.
pub(crate) fn parse_id0(raw: &str) -> AppResult<Id0> {
    Id0::parse(raw).map_err(|_| AppError::BadRequest("Invalid ID0".into()))
}
