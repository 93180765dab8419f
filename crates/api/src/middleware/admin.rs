//! Basic-auth gate for admin endpoints.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use seedpool_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that only succeeds for requests carrying the configured admin
/// credentials in an `Authorization: Basic ...` header.
///
/// ```ignore
/// async fn my_handler(_admin: RequireAdmin) -> AppResult<Json<()>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let encoded = header
            .strip_prefix("Basic ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Basic <credentials>"))?;

        let decoded = STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|raw| String::from_utf8(raw).ok())
            .ok_or_else(|| unauthorized("Malformed basic credentials"))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| unauthorized("Malformed basic credentials"))?;

        if !state.config.admin.matches(username, password) {
            tracing::warn!(username, "Rejected admin credentials");
            return Err(unauthorized("Invalid credentials"));
        }
        Ok(RequireAdmin)
    }
}
