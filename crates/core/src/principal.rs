//! Principal (registered account) entity.

use serde::Serialize;

use crate::types::{PrincipalId, Timestamp};

/// A registered account.
///
/// Contains the password hash -- NEVER serialize this to API responses.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: PrincipalId,
    /// Normalized email; unique across all principals.
    pub identity: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Optional profile data captured at registration.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Input for persisting a new principal. The store assigns timestamps.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub id: PrincipalId,
    pub identity: String,
    pub password_hash: String,
    pub profile: ProfileFields,
}

impl NewPrincipal {
    /// Build a new, active principal with a fresh time-ordered id.
    pub fn new(identity: String, password_hash: String, profile: ProfileFields) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            identity,
            password_hash,
            profile,
        }
    }
}

/// Public principal summary, safe to return to callers.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalInfo {
    pub id: PrincipalId,
    pub identity: String,
    pub full_name: Option<String>,
}

impl From<&Principal> for PrincipalInfo {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            identity: p.identity.clone(),
            full_name: p.full_name.clone(),
        }
    }
}
