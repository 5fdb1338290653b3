#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tessera_api::auth::jwt::{JwtConfig, TokenSigner};
use tessera_api::auth::service::SessionManager;
use tessera_api::config::ServerConfig;
use tessera_api::router::build_app_router;
use tessera_api::state::AppState;
use tessera_db::memory::{MemoryCredentialStore, MemorySessionStore};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        session_retention_hours: 24,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// A router plus handles on its in-memory stores.
///
/// The router is cheap to clone; every clone shares the same stores.
pub struct TestApp {
    pub router: Router,
    pub credentials: Arc<MemoryCredentialStore>,
    pub sessions: Arc<MemorySessionStore>,
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over fresh in-memory stores.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let credentials = Arc::new(MemoryCredentialStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let signer = Arc::new(TokenSigner::new(&config.jwt));
    let manager = SessionManager::new(credentials.clone(), sessions.clone(), signer);

    let state = AppState {
        sessions: Arc::new(manager),
    };

    TestApp {
        router: build_app_router(state, &config),
        credentials,
        sessions,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST an arbitrary body, optionally with a content type.
pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> Response<Body> {
    let mut builder = Request::post(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a principal and return the response JSON.
pub async fn register(app: Router, email: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "email": email, "password": password, "full_name": "Alice" });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}
