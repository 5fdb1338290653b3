//! In-process store backend.
//!
//! Each store guards its table with a single [`RwLock`]; every trait method
//! takes the lock once, so inserts and conditional revocations are atomic
//! exactly like the single-row statements of the PostgreSQL backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tessera_core::error::StoreError;
use tessera_core::principal::{NewPrincipal, Principal};
use tessera_core::session::{NewSession, SessionRecord};
use tessera_core::store::{CredentialStore, SessionStore};
use tessera_core::types::{DbId, PrincipalId, Timestamp};
use tokio::sync::RwLock;

/// [`CredentialStore`] keyed by normalized identity.
#[derive(Default)]
pub struct MemoryCredentialStore {
    principals: RwLock<HashMap<String, Principal>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored principals.
    pub async fn len(&self) -> usize {
        self.principals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.principals.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn exists_by_identity(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.principals.read().await.contains_key(identity))
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.principals.read().await.get(identity).cloned())
    }

    async fn save(&self, input: &NewPrincipal) -> Result<Principal, StoreError> {
        let mut principals = self.principals.write().await;
        if principals.contains_key(&input.identity) {
            return Err(StoreError::Duplicate("uq_principals_identity".into()));
        }
        let now = Utc::now();
        let principal = Principal {
            id: input.id,
            identity: input.identity.clone(),
            password_hash: input.password_hash.clone(),
            full_name: input.profile.full_name.clone(),
            phone: input.profile.phone.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        principals.insert(principal.identity.clone(), principal.clone());
        Ok(principal)
    }

    async fn set_active(&self, id: PrincipalId, active: bool) -> Result<bool, StoreError> {
        let mut principals = self.principals.write().await;
        match principals.values_mut().find(|p| p.id == id) {
            Some(p) => {
                p.is_active = active;
                p.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(
        &self,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut principals = self.principals.write().await;
        match principals.values_mut().find(|p| p.id == id) {
            Some(p) => {
                p.password_hash = password_hash.to_string();
                p.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
struct SessionTable {
    next_id: DbId,
    rows: HashMap<DbId, SessionRecord>,
    by_hash: HashMap<String, DbId>,
}

/// [`SessionStore`] with a unique index on the token hash.
#[derive(Default)]
pub struct MemorySessionStore {
    table: RwLock<SessionTable>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one principal, in insertion order.
    pub async fn sessions_for(&self, principal_id: PrincipalId) -> Vec<SessionRecord> {
        let table = self.table.read().await;
        let mut rows: Vec<_> = table
            .rows
            .values()
            .filter(|r| r.principal_id == principal_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, input: &NewSession) -> Result<SessionRecord, StoreError> {
        let mut table = self.table.write().await;
        if table.by_hash.contains_key(&input.token_hash) {
            return Err(StoreError::Duplicate("uq_sessions_token_hash".into()));
        }
        table.next_id += 1;
        let now = Utc::now();
        let record = SessionRecord {
            id: table.next_id,
            principal_id: input.principal_id,
            token_hash: input.token_hash.clone(),
            issued_at: input.issued_at,
            expires_at: input.expires_at,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        };
        table.by_hash.insert(record.token_hash.clone(), record.id);
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_hash
            .get(token_hash)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn revoke(&self, id: DbId, at: Timestamp) -> Result<bool, StoreError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(at);
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_principal(
        &self,
        principal_id: PrincipalId,
        at: Timestamp,
    ) -> Result<u64, StoreError> {
        let mut table = self.table.write().await;
        let mut revoked = 0;
        for record in table.rows.values_mut() {
            if record.principal_id == principal_id && record.revoked_at.is_none() {
                record.revoked_at = Some(at);
                record.updated_at = Utc::now();
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge_retired(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut table = self.table.write().await;
        let retired: Vec<(DbId, String)> = table
            .rows
            .values()
            .filter(|r| r.expires_at < cutoff || r.revoked_at.is_some_and(|at| at < cutoff))
            .map(|r| (r.id, r.token_hash.clone()))
            .collect();
        for (id, hash) in &retired {
            table.rows.remove(id);
            table.by_hash.remove(hash);
        }
        Ok(retired.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use chrono::Duration;
    use tessera_core::principal::ProfileFields;

    use super::*;

    fn new_principal(identity: &str) -> NewPrincipal {
        NewPrincipal::new(identity.into(), "hash".into(), ProfileFields::default())
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected() {
        let store = MemoryCredentialStore::new();
        store.save(&new_principal("a@x.com")).await.unwrap();

        let result = store.save(&new_principal("a@x.com")).await;
        assert_matches!(result, Err(StoreError::Duplicate(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_saves_yield_one_principal() {
        let store = Arc::new(MemoryCredentialStore::new());
        let tasks = (0..8).map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.save(&new_principal("race@x.com")).await })
        });
        let results = futures::future::join_all(tasks).await;

        let ok = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        assert_eq!(ok, 1, "exactly one concurrent save must win");
    }

    #[tokio::test]
    async fn set_active_toggles_flag() {
        let store = MemoryCredentialStore::new();
        let p = store.save(&new_principal("a@x.com")).await.unwrap();
        assert!(p.is_active);

        assert!(store.set_active(p.id, false).await.unwrap());
        let found = store.find_by_identity("a@x.com").await.unwrap().unwrap();
        assert!(!found.is_active);

        assert!(!store.set_active(uuid::Uuid::new_v4(), false).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_is_conditional() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        let principal_id = uuid::Uuid::new_v4();
        let rec = store
            .save(&NewSession::new(principal_id, "h1".into(), now, Duration::days(7)))
            .await
            .unwrap();

        assert!(store.revoke(rec.id, now).await.unwrap());
        assert!(!store.revoke(rec.id, now).await.unwrap(), "second revoke must lose");

        let found = store.find_by_token_hash("h1").await.unwrap().unwrap();
        assert_eq!(found.revoked_at, Some(now));
    }

    #[tokio::test]
    async fn concurrent_revokes_have_one_winner() {
        let store = Arc::new(MemorySessionStore::new());
        let now = Utc::now();
        let rec = store
            .save(&NewSession::new(uuid::Uuid::new_v4(), "h".into(), now, Duration::days(7)))
            .await
            .unwrap();

        let tasks = (0..8).map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.revoke(rec.id, Utc::now()).await })
        });
        let wins = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(true))))
            .count();
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn revoke_all_only_touches_owner() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        let alice = uuid::Uuid::new_v4();
        let bob = uuid::Uuid::new_v4();
        for (owner, hash) in [(alice, "a1"), (alice, "a2"), (bob, "b1")] {
            store
                .save(&NewSession::new(owner, hash.into(), now, Duration::days(7)))
                .await
                .unwrap();
        }

        assert_eq!(store.revoke_all_for_principal(alice, now).await.unwrap(), 2);
        assert!(store
            .sessions_for(alice)
            .await
            .iter()
            .all(|r| r.revoked_at.is_some()));
        assert!(store.sessions_for(bob).await[0].revoked_at.is_none());
    }

    #[tokio::test]
    async fn purge_removes_only_retired_rows() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        let owner = uuid::Uuid::new_v4();
        let expired = store
            .save(&NewSession::new(owner, "old".into(), now - Duration::days(10), Duration::days(7)))
            .await
            .unwrap();
        let revoked = store
            .save(&NewSession::new(owner, "rev".into(), now, Duration::days(7)))
            .await
            .unwrap();
        store.revoke(revoked.id, now - Duration::hours(2)).await.unwrap();
        store
            .save(&NewSession::new(owner, "live".into(), now, Duration::days(7)))
            .await
            .unwrap();

        let purged = store.purge_retired(now - Duration::hours(1)).await.unwrap();
        assert_eq!(purged, 2);
        assert!(store.find_by_token_hash(&expired.token_hash).await.unwrap().is_none());
        assert!(store.find_by_token_hash("rev").await.unwrap().is_none());
        assert!(store.find_by_token_hash("live").await.unwrap().is_some());
    }
}
