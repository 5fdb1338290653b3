//! Refresh-session records and their lifecycle states.

use chrono::Duration;

use crate::types::{DbId, PrincipalId, Timestamp};

/// Default lifetime of a refresh session, in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Lifecycle state of a session record at a given instant.
///
/// `Expired` and `Revoked` are both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Live,
    Expired,
    Revoked,
}

/// A persisted refresh session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: DbId,
    pub principal_id: PrincipalId,
    /// SHA-256 hex digest of the refresh token string.
    pub token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SessionRecord {
    /// Classify the record at `now`. Revocation wins over expiry.
    pub fn state_at(&self, now: Timestamp) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if now >= self.expires_at {
            SessionState::Expired
        } else {
            SessionState::Live
        }
    }

    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.state_at(now) == SessionState::Live
    }
}

/// Input for persisting a new session record.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub principal_id: PrincipalId,
    pub token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl NewSession {
    /// A session issued at `now`, expiring `ttl` later.
    pub fn new(principal_id: PrincipalId, token_hash: String, now: Timestamp, ttl: Duration) -> Self {
        Self {
            principal_id,
            token_hash,
            issued_at: now,
            expires_at: now + ttl,
        }
    }
}
