use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::auth::service::StoreHealth;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    /// `ok` when both stores answer, `degraded` otherwise.
    status: &'static str,
    version: &'static str,
    stores: StoreHealth,
}

/// GET /health -- service version and store reachability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stores = state.sessions.store_health().await;
    Json(HealthResponse {
        status: if stores.is_healthy() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        stores,
    })
}

/// Root-level health route; mounted outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
