//! PostgreSQL implementations of the core store traits.

use async_trait::async_trait;
use tessera_core::error::StoreError;
use tessera_core::principal::{NewPrincipal, Principal};
use tessera_core::session::{NewSession, SessionRecord};
use tessera_core::store::{CredentialStore, SessionStore};
use tessera_core::types::{DbId, PrincipalId, Timestamp};

use crate::repositories::{PrincipalRepo, SessionRepo};
use crate::{health_check, DbPool};

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error onto the store error taxonomy.
///
/// Unique violations become [`StoreError::Duplicate`] carrying the
/// constraint name; everything else is a backend failure.
pub fn classify_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return StoreError::Duplicate(constraint.to_string());
        }
    }
    StoreError::Backend(err.to_string())
}

/// [`CredentialStore`] backed by the `principals` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn exists_by_identity(&self, identity: &str) -> Result<bool, StoreError> {
        PrincipalRepo::exists_by_identity(&self.pool, identity)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>, StoreError> {
        let row = PrincipalRepo::find_by_identity(&self.pool, identity)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(row.map(Principal::from))
    }

    async fn save(&self, input: &NewPrincipal) -> Result<Principal, StoreError> {
        let row = PrincipalRepo::create(&self.pool, input)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(row.into())
    }

    async fn set_active(&self, id: PrincipalId, active: bool) -> Result<bool, StoreError> {
        PrincipalRepo::set_active(&self.pool, id, active)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn update_password(
        &self,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        PrincipalRepo::update_password(&self.pool, id, password_hash)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await.map_err(classify_sqlx_error)
    }
}

/// [`SessionStore`] backed by the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, input: &NewSession) -> Result<SessionRecord, StoreError> {
        let row = SessionRepo::create(&self.pool, input)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = SessionRepo::find_by_token_hash(&self.pool, token_hash)
            .await
            .map_err(classify_sqlx_error)?;
        Ok(row.map(SessionRecord::from))
    }

    async fn revoke(&self, id: DbId, at: Timestamp) -> Result<bool, StoreError> {
        SessionRepo::revoke(&self.pool, id, at)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn revoke_all_for_principal(
        &self,
        principal_id: PrincipalId,
        at: Timestamp,
    ) -> Result<u64, StoreError> {
        SessionRepo::revoke_all_for_principal(&self.pool, principal_id, at)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn purge_retired(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        SessionRepo::purge_retired(&self.pool, cutoff)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await.map_err(classify_sqlx_error)
    }
}
