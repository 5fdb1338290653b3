//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tessera_core::error::AuthError;
use tessera_core::principal::ProfileFields;
use tessera_core::types::PrincipalId;
use validator::Validate;

use crate::auth::service::AuthSession;
use crate::error::AppResult;
use crate::middleware::auth::AuthPrincipal;
use crate::middleware::json::AppJson;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
///
/// Email syntax and password length are checked by the session manager;
/// only profile field bounds are validated here.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(length(min = 3, max = 32))]
    pub phone: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh` and `POST /auth/logout`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /auth/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful authentication response returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub principal_id: PrincipalId,
    pub identity: String,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            principal_id: session.principal.id,
            identity: session.principal.identity,
        }
    }
}

/// Response body for `POST /auth/logout-all`.
#[derive(Debug, Serialize)]
pub struct RevokedResponse {
    pub revoked: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create a principal and return its first token pair. Returns 201.
pub async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let profile = ProfileFields {
        full_name: input.full_name,
        phone: input.phone,
    };
    let session = state
        .sessions
        .register(&input.email, &input.password, profile)
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state.sessions.login(&input.email, &input.password).await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a live refresh token for a new pair. The presented token is
/// retired and can never be used again.
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(input): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let session = state.sessions.refresh(&input.refresh_token).await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/auth/logout
///
/// Revoke the session behind a refresh token. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    AppJson(input): AppJson<RefreshRequest>,
) -> AppResult<StatusCode> {
    state.sessions.logout(&input.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout-all
///
/// Revoke every session of the authenticated principal.
pub async fn logout_all(
    State(state): State<AppState>,
    principal: AuthPrincipal,
) -> AppResult<Json<RevokedResponse>> {
    let revoked = state.sessions.logout_all(&principal.identity).await?;
    Ok(Json(RevokedResponse { revoked }))
}

/// POST /api/v1/auth/password
///
/// Change the authenticated principal's password and revoke all of its
/// sessions. Returns 204 No Content.
pub async fn change_password(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    AppJson(input): AppJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .sessions
        .change_password(
            &principal.identity,
            &input.current_password,
            &input.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
