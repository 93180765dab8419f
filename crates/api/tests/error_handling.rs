//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use seedpool_api::error::AppError;
use seedpool_core::error::CoreError;
use seedpool_core::submission::SubmissionError;

/// Helper: convert an `AppError` into its status code, headers and parsed JSON body.
async fn error_to_response(
    err: AppError,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, headers, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::job_not_found("0123456789abcdef0123456789abcdef"));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(
        json["message"],
        "Job with id 0123456789abcdef0123456789abcdef not found"
    );
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Invalid ID0".into());

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["message"], "Invalid ID0");
}

// ---------------------------------------------------------------------------
// Test: invalid submission fields are listed in the body
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_fields_are_listed() {
    let err = AppError::Core(SubmissionError::InvalidFields(vec!["id0", "mii"]).into());

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["message"], "invalid:id0,mii");
    assert_eq!(json["fields"], serde_json::json!(["id0", "mii"]));
}

// ---------------------------------------------------------------------------
// Test: a missing submission key is a plain validation error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_field_returns_400_without_field_list() {
    let err = AppError::Core(SubmissionError::MissingField("model").into());

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["message"], "Missing parameter 'model'");
    assert!(json.get("fields").is_none());
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409 with CONFLICT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("job is not canceled".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["message"], "job is not canceled");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Unauthorized maps to 401 with a basic-auth challenge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401_with_challenge() {
    let err = AppError::Core(CoreError::Unauthorized("Invalid credentials".into()));

    let (status, headers, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(
        headers.get("www-authenticate").unwrap(),
        "Basic realm=\"Login Required\""
    );
}

// ---------------------------------------------------------------------------
// Test: internal errors are sanitized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Internal("disk full at /srv/movables".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(
        !json.to_string().contains("/srv/movables"),
        "Internal error response must not leak details"
    );
    assert_eq!(json["message"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: every error body is tagged with result = "error"
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_bodies_carry_error_result() {
    for err in [
        AppError::BadRequest("Invalid ID0".into()),
        AppError::Core(CoreError::job_not_found("0123456789abcdef0123456789abcdef")),
        AppError::Core(CoreError::Conflict("nope".into())),
    ] {
        let (_, _, json) = error_to_response(err).await;
        assert_eq!(json["result"], "error");
        assert!(json["message"].is_string());
    }
}
