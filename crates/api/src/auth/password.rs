//! Credential hashing for the session manager.
//!
//! Hashes are Argon2id PHC strings, so parameters and salt travel with the
//! hash. Argon2 is CPU-bound, so the async entry points run it on the
//! blocking pool and never on a runtime worker thread.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tessera_core::error::AuthError;

/// Well-formed Argon2id hash with default parameters that matches no password.
///
/// Login verifies against it when the identity is unknown so both failure
/// paths cost one full hash.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGVzc2VyYS1kdW1teS1zYQ\
                          $AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Hash `password` with a fresh salt.
pub async fn hash(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    run_blocking(move || hash_sync(&password))
        .await?
        .map_err(|e| AuthError::Internal(format!("Password hashing error: {e}")))
}

/// Check `password` against a stored PHC hash.
///
/// A malformed stored hash is an internal error, not a mismatch.
pub async fn verify(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    run_blocking(move || verify_sync(&password, &stored_hash))
        .await?
        .map_err(|e| AuthError::Internal(format!("Password verification error: {e}")))
}

/// Spend one verification against [`DUMMY_HASH`]. Never matches.
pub async fn verify_dummy(password: &str) -> Result<(), AuthError> {
    let password = password.to_owned();
    run_blocking(move || {
        let _ = verify_sync(&password, DUMMY_HASH);
    })
    .await
}

async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Internal(format!("Password task failed: {e}")))
}

fn hash_sync(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_sync(password: &str, stored_hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(stored_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let stored = hash("correct-horse-battery-staple").await.unwrap();

        assert!(stored.starts_with("$argon2id$"), "expected argon2id PHC prefix");
        assert!(!stored.contains("correct-horse"), "hash must not embed the plaintext");
        assert!(verify("correct-horse-battery-staple", &stored).await.unwrap());
        assert!(!verify("wrong-password", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash("pw1234").await.unwrap();
        let b = hash("pw1234").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_internal() {
        assert_matches!(
            verify("pw1234", "not-a-phc-string").await,
            Err(AuthError::Internal(_))
        );
    }

    #[test]
    fn dummy_hash_parses_and_never_matches() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_sync("pw1234", DUMMY_HASH).unwrap());
        assert!(!verify_sync("", DUMMY_HASH).unwrap());
    }

    #[tokio::test]
    async fn dummy_verification_completes() {
        verify_dummy("anything").await.unwrap();
    }
}
