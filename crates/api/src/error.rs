use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tessera_core::error::AuthError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`AuthError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from the session manager.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The request body could not be read or parsed as the expected JSON.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// Missing or malformed bearer credentials on an authenticated route.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Auth(auth) => classify_auth_error(auth),
            AppError::InvalidBody(rejection) => classify_body_rejection(rejection),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map an [`AuthError`] onto an HTTP status, error code, and message.
///
/// Internal failures are logged and replaced with a generic message.
fn classify_auth_error(err: &AuthError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        AuthError::DuplicateIdentity => (StatusCode::CONFLICT, "CONFLICT", message),
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
        }
        AuthError::AccountDisabled => (StatusCode::FORBIDDEN, "ACCOUNT_DISABLED", message),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", message),
        AuthError::TokenExpiredOrRevoked => {
            (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED_OR_REVOKED", message)
        }
        AuthError::PrincipalNotFound => {
            (StatusCode::UNAUTHORIZED, "PRINCIPAL_NOT_FOUND", message)
        }
        AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Oversized bodies keep their 413; every other body problem is a 400.
fn classify_body_rejection(rejection: &JsonRejection) -> (StatusCode, &'static str, String) {
    let message = rejection.body_text();
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", message)
    } else {
        (StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_sanitized() {
        let (status, code, message) =
            classify_auth_error(&AuthError::Internal("pool timed out at 10.0.0.4".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("10.0.0.4"));
    }

    #[test]
    fn business_errors_map_to_client_statuses() {
        let cases = [
            (AuthError::DuplicateIdentity, StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountDisabled, StatusCode::FORBIDDEN),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpiredOrRevoked, StatusCode::UNAUTHORIZED),
            (AuthError::PrincipalNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::Validation("bad".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(classify_auth_error(&err).0, expected, "{err:?}");
        }
    }
}
