#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// One or more submission fields failed validation. Every failing field
    /// is listed so a client can fix them in a single round trip.
    #[error("Invalid fields: {}", .0.join(","))]
    InvalidFields(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing job keyed by its id0.
    pub fn job_not_found(id0: &str) -> Self {
        CoreError::NotFound {
            entity: "Job",
            id: id0.to_string(),
        }
    }
}
