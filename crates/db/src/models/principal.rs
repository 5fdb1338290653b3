//! Principal row model.

use sqlx::FromRow;
use tessera_core::principal::Principal;
use tessera_core::types::{PrincipalId, Timestamp};

/// Full principal row from the `principals` table.
#[derive(Debug, Clone, FromRow)]
pub struct PrincipalRow {
    pub id: PrincipalId,
    pub identity: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Principal {
            id: row.id,
            identity: row.identity,
            password_hash: row.password_hash,
            full_name: row.full_name,
            phone: row.phone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
