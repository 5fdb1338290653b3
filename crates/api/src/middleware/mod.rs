//! Request extractors.
//!
//! - [`auth::AuthPrincipal`] -- Extracts the authenticated principal from a JWT Bearer token.
//! - [`json::AppJson`] -- JSON request bodies with `{error, code}` rejections.

pub mod auth;
pub mod json;
