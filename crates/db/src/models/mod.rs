//! Row structs for the `principals` and `sessions` tables.
//!
//! Each row converts into its `tessera_core` entity; the core types stay
//! free of sqlx.

pub mod principal;
pub mod session;
