//! Repository for the `sessions` table.

use sqlx::PgPool;
use tessera_core::session::NewSession;
use tessera_core::types::{DbId, PrincipalId, Timestamp};

use crate::models::session::SessionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, principal_id, token_hash, issued_at, expires_at, revoked_at, \
                        created_at, updated_at";

/// Provides CRUD operations for refresh sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewSession) -> Result<SessionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (principal_id, token_hash, issued_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(input.principal_id)
            .bind(&input.token_hash)
            .bind(input.issued_at)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its refresh token hash, whatever its state.
    ///
    /// Liveness is judged by the caller so revoked and expired rows can be
    /// told apart from unknown tokens.
    pub async fn find_by_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE token_hash = $1");
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a single session. Returns `true` only if this call revoked it.
    pub async fn revoke(pool: &PgPool, id: DbId, at: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $2, updated_at = NOW()
             WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all unrevoked sessions for a principal. Returns the count revoked.
    pub async fn revoke_all_for_principal(
        pool: &PgPool,
        principal_id: PrincipalId,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $2, updated_at = NOW()
             WHERE principal_id = $1 AND revoked_at IS NULL",
        )
        .bind(principal_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete sessions revoked or expired before `cutoff`. Returns the count deleted.
    pub async fn purge_retired(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE expires_at < $1 OR revoked_at < $1")
                .bind(cutoff)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
