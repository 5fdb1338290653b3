//! Authentication primitives and the session manager.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- token signing/verification and refresh-token digests.
//! - [`service`] -- the [`service::SessionManager`].

pub mod jwt;
pub mod password;
pub mod service;
