//! Periodic purge of retired sessions.
//!
//! Revoked and expired session rows are dead weight once past the retention
//! window. Refresh never depends on this job: expiry is evaluated lazily on
//! every lookup.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tessera_core::store::SessionStore;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run one purge pass. Returns the number of rows deleted.
pub async fn purge_once(
    sessions: &dyn SessionStore,
    retention_hours: i64,
) -> Result<u64, tessera_core::error::StoreError> {
    let cutoff = Utc::now() - chrono::Duration::hours(retention_hours);
    sessions.purge_retired(cutoff).await
}

/// Run the session retention loop until `cancel` is triggered.
pub async fn run(
    sessions: Arc<dyn SessionStore>,
    retention_hours: i64,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_hours,
        interval_secs = interval.as_secs(),
        "Session retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                match purge_once(sessions.as_ref(), retention_hours).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session retention: purged retired rows");
                        } else {
                            tracing::debug!("Session retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session retention: cleanup failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use tessera_core::session::NewSession;
    use tessera_db::memory::MemorySessionStore;

    use super::*;

    #[tokio::test]
    async fn purges_rows_past_retention_only() {
        let store = MemorySessionStore::new();
        let owner = uuid::Uuid::new_v4();
        let now = Utc::now();

        let stale = store
            .save(&NewSession::new(owner, "stale".into(), now, ChronoDuration::days(7)))
            .await
            .unwrap();
        store.revoke(stale.id, now - ChronoDuration::hours(48)).await.unwrap();

        let recent = store
            .save(&NewSession::new(owner, "recent".into(), now, ChronoDuration::days(7)))
            .await
            .unwrap();
        store.revoke(recent.id, now).await.unwrap();

        assert_eq!(purge_once(&store, 24).await.unwrap(), 1);
        assert!(store.find_by_token_hash("stale").await.unwrap().is_none());
        assert!(store.find_by_token_hash("recent").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn loop_stops_on_cancel() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(store, 24, Duration::from_millis(10), cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("retention loop should stop promptly")
            .expect("retention loop should not panic");
    }
}
