//! JWT signing and verification for access and refresh tokens.
//!
//! Both token kinds are HS256-signed JWTs carrying the principal's identity
//! as `sub`. A refresh token string is additionally the lookup key of its
//! session record; only its SHA-256 digest is persisted so a store leak does
//! not expose live sessions.

use std::fmt;
use std::sync::{Arc, RwLock};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::{parse_in_range, ConfigError};

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Upper bound for access token expiry (one day).
const MAX_ACCESS_EXPIRY_MINS: i64 = 24 * 60;
/// Upper bound for refresh token expiry (one year).
const MAX_REFRESH_EXPIRY_DAYS: i64 = 365;

/// Which credential a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the principal's normalized identity (email).
    pub sub: String,
    /// Token kind; a refresh token is never accepted as an access token.
    pub typ: TokenKind,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4); keeps tokens minted in the same
    /// second distinct.
    pub jti: String,
}

/// Verification failures. Expiry is reported separately so callers can tell
/// "re-authenticate" apart from "this was never a valid token".
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Configuration for JWT token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry_mins", &self.access_token_expiry_mins)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

impl JwtConfig {
    /// Load JWT configuration through a variable lookup.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    pub fn from_vars(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let access_token_expiry_mins = parse_in_range(
            lookup,
            "JWT_ACCESS_EXPIRY_MINS",
            DEFAULT_ACCESS_EXPIRY_MINS,
            1..=MAX_ACCESS_EXPIRY_MINS,
        )?;
        let refresh_token_expiry_days = parse_in_range(
            lookup,
            "JWT_REFRESH_EXPIRY_DAYS",
            DEFAULT_REFRESH_EXPIRY_DAYS,
            0..=MAX_REFRESH_EXPIRY_DAYS,
        )?;

        Ok(Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        })
    }
}

/// Key pair used to sign and verify tokens.
#[derive(Clone)]
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    /// HMAC keys derived from a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Mints and verifies signed, time-bounded tokens.
///
/// The keys sit behind a lock so they can be replaced at runtime with
/// [`TokenSigner::replace_keys`]; every token signed with the old keys stops
/// verifying at that moment.
pub struct TokenSigner {
    keys: RwLock<Arc<SigningKeys>>,
    validation: Validation,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenSigner {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys: RwLock::new(Arc::new(SigningKeys::from_secret(config.secret.as_bytes()))),
            validation,
            access_ttl: chrono::Duration::minutes(config.access_token_expiry_mins),
            refresh_ttl: chrono::Duration::days(config.refresh_token_expiry_days),
        }
    }

    /// Swap the signing and verification keys.
    pub fn replace_keys(&self, keys: SigningKeys) {
        let mut guard = self.keys.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(keys);
        tracing::info!("Token signing keys replaced");
    }

    /// Lifetime of access tokens.
    pub fn access_ttl(&self) -> chrono::Duration {
        self.access_ttl
    }

    /// Lifetime of refresh tokens (and of their session records).
    pub fn refresh_ttl(&self) -> chrono::Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, identity: &str) -> Result<String, TokenError> {
        self.issue_at(identity, TokenKind::Access, chrono::Utc::now().timestamp())
    }

    pub fn issue_refresh(&self, identity: &str) -> Result<String, TokenError> {
        self.issue_at(identity, TokenKind::Refresh, chrono::Utc::now().timestamp())
    }

    /// Sign a token of `kind` as if issued at `iat`.
    fn issue_at(&self, identity: &str, kind: TokenKind, iat: i64) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: identity.to_string(),
            typ: kind,
            exp: iat + ttl.num_seconds(),
            iat,
            jti: Uuid::new_v4().to_string(),
        };

        let keys = self.current_keys();
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, expiry and kind, returning the embedded [`Claims`].
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let keys = self.current_keys();
        let data = decode::<Claims>(token, &keys.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.typ != expected {
            return Err(TokenError::Invalid(format!(
                "expected {expected:?} token, got {:?}",
                data.claims.typ
            )));
        }
        Ok(data.claims)
    }

    /// Verify a token and return its subject identity.
    pub fn extract_identity(&self, token: &str, expected: TokenKind) -> Result<String, TokenError> {
        self.verify(token, expected).map(|claims| claims.sub)
    }

    fn current_keys(&self) -> Arc<SigningKeys> {
        let guard = self.keys.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }
}

/// Compute the SHA-256 hex digest of a refresh token.
///
/// Session records are stored and looked up by this digest.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
