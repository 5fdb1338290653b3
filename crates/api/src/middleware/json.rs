//! JSON body extractor whose rejections use the API error format.

use axum::extract::FromRequest;

use crate::error::AppError;

/// Drop-in replacement for [`axum::Json`] as a handler argument.
///
/// Malformed or oversized bodies are reported as [`AppError::InvalidBody`]
/// instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
