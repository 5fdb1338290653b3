//! Store traits composed by the session manager.
//!
//! Implementations provide atomic single-record reads and writes plus
//! unique-constraint enforcement on identity. They carry no business rules.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::principal::{NewPrincipal, Principal};
use crate::session::{NewSession, SessionRecord};
use crate::types::{DbId, PrincipalId, Timestamp};

/// Persistent mapping of identity to password hash and account state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn exists_by_identity(&self, identity: &str) -> Result<bool, StoreError>;

    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>, StoreError>;

    /// Insert a principal. A taken identity yields [`StoreError::Duplicate`],
    /// even when two inserts race.
    async fn save(&self, input: &NewPrincipal) -> Result<Principal, StoreError>;

    /// Toggle the active flag. Returns `false` if no such principal exists.
    async fn set_active(&self, id: PrincipalId, active: bool) -> Result<bool, StoreError>;

    /// Replace the stored password hash. Returns `false` if no such principal exists.
    async fn update_password(&self, id: PrincipalId, password_hash: &str)
        -> Result<bool, StoreError>;

    /// Cheap reachability probe used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Persistent collection of refresh-session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, input: &NewSession) -> Result<SessionRecord, StoreError>;

    /// Look up a record by the digest of its refresh token.
    async fn find_by_token_hash(&self, token_hash: &str)
        -> Result<Option<SessionRecord>, StoreError>;

    /// Set `revoked_at = at` only if the record is not already revoked.
    ///
    /// Returns `true` if this call performed the revocation and `false` if
    /// the record was already revoked (or does not exist). This conditional
    /// write is the serialization point for refresh rotation.
    async fn revoke(&self, id: DbId, at: Timestamp) -> Result<bool, StoreError>;

    /// Revoke every unrevoked record of a principal. Returns the count revoked.
    async fn revoke_all_for_principal(
        &self,
        principal_id: PrincipalId,
        at: Timestamp,
    ) -> Result<u64, StoreError>;

    /// Delete records revoked or expired before `cutoff`. Returns the count deleted.
    async fn purge_retired(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
