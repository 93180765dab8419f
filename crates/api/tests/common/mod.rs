#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use seedpool_api::config::{AdminCredentials, ServerConfig};
use seedpool_api::router::build_app_router;
use seedpool_api::state::AppState;
use seedpool_core::artifacts::MemoryArtifactStore;
use seedpool_core::coordinator::{Coordinator, CoordinatorConfig};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "hunter2";

/// Multipart boundary used by [`post_multipart`].
const BOUNDARY: &str = "seedpool-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:7799".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        artifact_dir: PathBuf::from("unused"),
        admin: AdminCredentials {
            username: ADMIN_USER.to_string(),
            password: ADMIN_PASS.to_string(),
        },
        coordinator: CoordinatorConfig::default(),
    }
}

/// Build the full application router backed by an in-memory artifact store.
///
/// Goes through `build_app_router` so tests exercise the production
/// middleware stack.
pub fn build_test_app() -> Router {
    build_test_app_with(CoordinatorConfig::default())
}

pub fn build_test_app_with(coordinator_config: CoordinatorConfig) -> Router {
    let mut config = test_config();
    config.coordinator = coordinator_config.clone();

    let coordinator = Coordinator::new(coordinator_config, Arc::new(MemoryArtifactStore::new()), 0);
    let state = AppState {
        config: Arc::new(config.clone()),
        coordinator: Arc::new(coordinator),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const ID0: &str = "0123456789abcdef0123456789abcdef";
pub const OTHER_ID0: &str = "fedcba9876543210fedcba9876543210";

/// 112 bytes of plausible mii data.
pub fn mii_bytes() -> Vec<u8> {
    (0..112u8).map(|b| b.wrapping_mul(7)).collect()
}

pub fn mii_base64() -> String {
    STANDARD.encode(mii_bytes())
}

pub fn mii_submission(id0: &str) -> serde_json::Value {
    serde_json::json!({
        "id0": id0,
        "model": "new",
        "year": 2017,
        "mii_data": mii_base64(),
    })
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// GET with an `X-Forwarded-For` header so the caller has a stable address.
pub async fn get_from(app: Router, uri: &str, addr: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("x-forwarded-for", addr)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_with_basic_auth(app: Router, uri: &str, user: &str, pass: &str) -> Response<Body> {
    let credentials = STANDARD.encode(format!("{user}:{pass}"));
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Basic {credentials}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_as_admin(app: Router, uri: &str) -> Response<Body> {
    get_with_basic_auth(app, uri, ADMIN_USER, ADMIN_PASS).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a multipart form with text fields and an optional
/// `(field, filename, content_type, bytes)` file part.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Response<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
