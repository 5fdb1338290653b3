//! Session manager: registration, login, refresh rotation and logout.
//!
//! This is the only component with business rules. It composes a
//! [`CredentialStore`], a [`SessionStore`] and the [`TokenSigner`], and owns
//! every invariant around session validity:
//!
//! - a refresh token is single-use; the conditional revoke of its record is
//!   the serialization point between concurrent refreshes,
//! - the stored record is authoritative for revocation and expiry, and the
//!   token signature must verify as well,
//! - unknown identity and wrong password are indistinguishable.
//!
//! A disabled principal can neither log in nor refresh. Access tokens already
//! issued stay valid until they expire.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tessera_core::error::{AuthError, StoreError};
use tessera_core::identity::{normalize_identity, parse_identity, validate_password};
use tessera_core::principal::{NewPrincipal, Principal, PrincipalInfo, ProfileFields};
use tessera_core::session::NewSession;
use tessera_core::store::{CredentialStore, SessionStore};
use tessera_core::types::PrincipalId;

use crate::auth::jwt::{hash_refresh_token, TokenError, TokenKind, TokenSigner};
use crate::auth::password;

/// Token pair and principal summary returned by register, login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub principal: PrincipalInfo,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpiredOrRevoked,
            TokenError::Invalid(_) => AuthError::InvalidToken,
            TokenError::Signing(msg) => AuthError::Internal(format!("Token signing error: {msg}")),
        }
    }
}

/// Reachability of the two stores, as reported by `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub credentials: bool,
    pub sessions: bool,
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        self.credentials && self.sessions
    }
}

/// Orchestrates the credential and session lifecycle.
pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    signer: Arc<TokenSigner>,
}

impl SessionManager {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            signer,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Probe both stores. Failures are logged, never propagated.
    pub async fn store_health(&self) -> StoreHealth {
        let (credentials, sessions) =
            tokio::join!(self.credentials.ping(), self.sessions.ping());
        if let Err(e) = &credentials {
            tracing::warn!(error = %e, "Credential store ping failed");
        }
        if let Err(e) = &sessions {
            tracing::warn!(error = %e, "Session store ping failed");
        }
        StoreHealth {
            credentials: credentials.is_ok(),
            sessions: sessions.is_ok(),
        }
    }

    /// Create a principal and open its first session.
    pub async fn register(
        &self,
        identity: &str,
        password: &str,
        profile: ProfileFields,
    ) -> Result<AuthSession, AuthError> {
        let identity = parse_identity(identity)?;
        validate_password(password)?;

        if self.credentials.exists_by_identity(&identity).await? {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = password::hash(password).await?;
        let input = NewPrincipal::new(identity, password_hash, profile);

        // The existence check above can race; the store's unique constraint decides.
        let principal = match self.credentials.save(&input).await {
            Ok(p) => p,
            Err(StoreError::Duplicate(_)) => return Err(AuthError::DuplicateIdentity),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(principal_id = %principal.id, "Principal registered");

        self.open_session(&principal).await
    }

    /// Authenticate with identity and password and open a new session.
    pub async fn login(&self, identity: &str, password: &str) -> Result<AuthSession, AuthError> {
        let identity = normalize_identity(identity);

        let Some(principal) = self.credentials.find_by_identity(&identity).await? else {
            password::verify_dummy(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let valid = password::verify(password, &principal.password_hash).await?;
        if !valid {
            tracing::debug!(principal_id = %principal.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        // Only reported once the password is proven, so disabled accounts do
        // not reveal themselves to credential guessing.
        if !principal.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.open_session(&principal).await
    }

    /// Exchange a live refresh token for a new token pair, retiring the old one.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let record = self
            .sessions
            .find_by_token_hash(&hash_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let now = Utc::now();
        if !record.is_live_at(now) {
            return Err(AuthError::TokenExpiredOrRevoked);
        }

        let identity = self
            .signer
            .extract_identity(refresh_token, TokenKind::Refresh)?;

        let principal = self
            .credentials
            .find_by_identity(&identity)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if principal.id != record.principal_id {
            tracing::warn!(
                session_id = record.id,
                principal_id = %principal.id,
                "Refresh token subject does not own its session"
            );
            return Err(AuthError::InvalidToken);
        }

        if !principal.is_active {
            return Err(AuthError::AccountDisabled);
        }

        if !self.sessions.revoke(record.id, now).await? {
            tracing::info!(
                session_id = record.id,
                principal_id = %principal.id,
                "Refresh lost rotation race; token already revoked"
            );
            return Err(AuthError::TokenExpiredOrRevoked);
        }

        self.open_session(&principal).await
    }

    /// Revoke the session behind a refresh token. Revoking twice is not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let record = self
            .sessions
            .find_by_token_hash(&hash_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let revoked = self.sessions.revoke(record.id, Utc::now()).await?;
        tracing::info!(
            session_id = record.id,
            principal_id = %record.principal_id,
            revoked,
            "Session logged out"
        );
        Ok(())
    }

    /// Revoke every live session of a principal. Returns the count revoked.
    pub async fn revoke_all_sessions(&self, principal_id: PrincipalId) -> Result<u64, AuthError> {
        let revoked = self
            .sessions
            .revoke_all_for_principal(principal_id, Utc::now())
            .await?;
        tracing::info!(%principal_id, revoked, "Revoked all sessions");
        Ok(revoked)
    }

    /// Log out every device of the principal holding `identity`.
    pub async fn logout_all(&self, identity: &str) -> Result<u64, AuthError> {
        let principal = self.principal_for(identity).await?;
        self.revoke_all_sessions(principal.id).await
    }

    /// Replace the password after proving the current one, then revoke every
    /// session so all devices must log in again.
    pub async fn change_password(
        &self,
        identity: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<u64, AuthError> {
        let principal = self.principal_for(identity).await?;

        let valid = password::verify(current_password, &principal.password_hash).await?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new_password)?;

        let password_hash = password::hash(new_password).await?;
        if !self
            .credentials
            .update_password(principal.id, &password_hash)
            .await?
        {
            return Err(AuthError::PrincipalNotFound);
        }
        tracing::info!(principal_id = %principal.id, "Password changed");

        self.revoke_all_sessions(principal.id).await
    }

    async fn principal_for(&self, identity: &str) -> Result<Principal, AuthError> {
        self.credentials
            .find_by_identity(&normalize_identity(identity))
            .await?
            .ok_or(AuthError::PrincipalNotFound)
    }

    /// Mint an access/refresh pair and persist the refresh session.
    async fn open_session(&self, principal: &Principal) -> Result<AuthSession, AuthError> {
        let access_token = self.signer.issue_access(&principal.identity)?;
        let refresh_token = self.signer.issue_refresh(&principal.identity)?;

        let record = self
            .sessions
            .save(&NewSession::new(
                principal.id,
                hash_refresh_token(&refresh_token),
                Utc::now(),
                self.signer.refresh_ttl(),
            ))
            .await?;
        tracing::debug!(
            session_id = record.id,
            principal_id = %principal.id,
            "Session opened"
        );

        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_in: self.signer.access_ttl().num_seconds(),
            principal: PrincipalInfo::from(principal),
        })
    }
}
