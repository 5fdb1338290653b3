//! Error taxonomy for credential and session operations.

/// Failures surfaced by the session manager.
///
/// Every variant except [`AuthError::Internal`] is a user-facing business
/// rule failure: the caller must re-authenticate or fix its input. `Internal`
/// covers store connectivity and signer misconfiguration; its message is for
/// server logs only and must not reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email already registered")]
    DuplicateIdentity,

    /// Unknown identity and wrong password share this variant and message.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Refresh token is expired or revoked")]
    TokenExpiredOrRevoked,

    #[error("Principal not found")]
    PrincipalNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures reported by a credential or session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. identity already taken).
    #[error("Duplicate value violates unique constraint: {0}")]
    Duplicate(String),

    /// The backend is unreachable or returned an unexpected failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn store_errors_become_internal() {
        let err: AuthError = StoreError::Backend("connection reset".into()).into();
        assert_matches!(err, AuthError::Internal(msg) if msg.contains("connection reset"));
    }

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}
