use std::sync::Arc;

use crate::auth::service::SessionManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Session manager wired to the configured store backend.
    pub sessions: Arc<SessionManager>,
}
