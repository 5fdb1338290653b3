//! Identity (email) and password input rules applied at the boundary.

use validator::ValidateEmail;

use crate::error::AuthError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum accepted password length. Bounds the cost of a single hash.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Normalize an email identity: trim surrounding whitespace and lowercase it.
///
/// Every store lookup and insert goes through this so `Alice@X.com` and
/// `alice@x.com` name the same principal.
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize and validate an email identity.
pub fn parse_identity(raw: &str) -> Result<String, AuthError> {
    let identity = normalize_identity(raw);
    if identity.is_empty() {
        return Err(AuthError::Validation("Email must not be empty".into()));
    }
    if !identity.validate_email() {
        return Err(AuthError::Validation(format!(
            "'{identity}' is not a valid email address"
        )));
    }
    Ok(identity)
}

/// Validate that a password meets the length requirements.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
