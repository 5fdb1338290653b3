//! Bearer access-token extractor for authenticated routes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::jwt::{TokenError, TokenKind};
use crate::error::AppError;
use crate::state::AppState;

/// Principal behind the access token in the `Authorization` header.
///
/// Refresh tokens are rejected here even though they carry a valid signature.
///
/// ```ignore
/// async fn my_handler(principal: AuthPrincipal) -> AppResult<Json<()>> {
///     tracing::info!(identity = %principal.identity, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPrincipal {
    /// Normalized identity from `claims.sub`.
    pub identity: String,
}

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let identity = state
            .sessions
            .signer()
            .extract_identity(token, TokenKind::Access)
            .map_err(|e| match e {
                TokenError::Expired => AppError::Unauthorized("Access token has expired".into()),
                _ => AppError::Unauthorized("Invalid access token".into()),
            })?;

        Ok(AuthPrincipal { identity })
    }
}

/// Pull the credentials out of `Authorization: Bearer <token>`.
///
/// The scheme name is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".into()))?;

    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn accepts_bearer_scheme_in_any_case() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers_with("bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_or_foreign_schemes() {
        assert_matches!(bearer_token(&HeaderMap::new()), Err(AppError::Unauthorized(_)));
        assert_matches!(
            bearer_token(&headers_with("Basic dXNlcjpwdw==")),
            Err(AppError::Unauthorized(_))
        );
        assert_matches!(bearer_token(&headers_with("Bearer ")), Err(AppError::Unauthorized(_)));
        assert_matches!(bearer_token(&headers_with("Bearer")), Err(AppError::Unauthorized(_)));
    }
}
