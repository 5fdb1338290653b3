//! Repository for the `principals` table.

use sqlx::PgPool;
use tessera_core::principal::NewPrincipal;
use tessera_core::types::PrincipalId;

use crate::models::principal::PrincipalRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, identity, password_hash, full_name, phone, is_active, \
                        created_at, updated_at";

/// Provides CRUD operations for principals.
pub struct PrincipalRepo;

impl PrincipalRepo {
    /// Insert a new principal, returning the created row.
    ///
    /// A taken identity fails with the `uq_principals_identity` constraint.
    pub async fn create(pool: &PgPool, input: &NewPrincipal) -> Result<PrincipalRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO principals (id, identity, password_hash, full_name, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PrincipalRow>(&query)
            .bind(input.id)
            .bind(&input.identity)
            .bind(&input.password_hash)
            .bind(&input.profile.full_name)
            .bind(&input.profile.phone)
            .fetch_one(pool)
            .await
    }

    /// Find a principal by normalized identity.
    pub async fn find_by_identity(
        pool: &PgPool,
        identity: &str,
    ) -> Result<Option<PrincipalRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM principals WHERE identity = $1");
        sqlx::query_as::<_, PrincipalRow>(&query)
            .bind(identity)
            .fetch_optional(pool)
            .await
    }

    /// Check whether a principal with this identity exists.
    pub async fn exists_by_identity(pool: &PgPool, identity: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM principals WHERE identity = $1)")
                .bind(identity)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Set the active flag. Returns `true` if the row exists.
    pub async fn set_active(pool: &PgPool, id: PrincipalId, active: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE principals SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update a principal's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE principals SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
