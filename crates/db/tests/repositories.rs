//! PostgreSQL repository tests.
//!
//! These need a reachable database via `DATABASE_URL`; run them with
//! `cargo test -p tessera-db -- --ignored`.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tessera_core::error::StoreError;
use tessera_core::principal::{NewPrincipal, ProfileFields};
use tessera_core::session::NewSession;
use tessera_core::store::{CredentialStore, SessionStore};
use tessera_db::store::{PgCredentialStore, PgSessionStore};

fn alice() -> NewPrincipal {
    NewPrincipal::new(
        "alice@x.com".into(),
        "$argon2id$placeholder".into(),
        ProfileFields {
            full_name: Some("Alice".into()),
            phone: None,
        },
    )
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    tessera_db::health_check(&pool).await.unwrap();
    PgCredentialStore::new(pool.clone()).ping().await.unwrap();
    PgSessionStore::new(pool).ping().await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_identity_maps_to_duplicate(pool: PgPool) {
    let store = PgCredentialStore::new(pool);
    let created = store.save(&alice()).await.unwrap();
    assert!(created.is_active);
    assert_eq!(created.full_name.as_deref(), Some("Alice"));
    assert!(store.exists_by_identity("alice@x.com").await.unwrap());

    let result = store.save(&alice()).await;
    assert_matches!(result, Err(StoreError::Duplicate(c)) if c == "uq_principals_identity");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_session_revoke_is_conditional(pool: PgPool) {
    let principals = PgCredentialStore::new(pool.clone());
    let sessions = PgSessionStore::new(pool);
    let principal = principals.save(&alice()).await.unwrap();

    let now = Utc::now();
    let record = sessions
        .save(&NewSession::new(principal.id, "digest".into(), now, Duration::days(7)))
        .await
        .unwrap();
    assert!(record.revoked_at.is_none());

    assert!(sessions.revoke(record.id, now).await.unwrap());
    assert!(!sessions.revoke(record.id, now).await.unwrap());

    let found = sessions.find_by_token_hash("digest").await.unwrap().unwrap();
    assert!(found.revoked_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_revoke_all_and_purge(pool: PgPool) {
    let principals = PgCredentialStore::new(pool.clone());
    let sessions = PgSessionStore::new(pool);
    let principal = principals.save(&alice()).await.unwrap();

    let now = Utc::now();
    for hash in ["one", "two"] {
        sessions
            .save(&NewSession::new(principal.id, hash.into(), now, Duration::days(7)))
            .await
            .unwrap();
    }

    let revoked_at = now - Duration::hours(3);
    assert_eq!(
        sessions
            .revoke_all_for_principal(principal.id, revoked_at)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        sessions
            .purge_retired(now - Duration::hours(1))
            .await
            .unwrap(),
        2
    );
    assert!(sessions.find_by_token_hash("one").await.unwrap().is_none());
}
