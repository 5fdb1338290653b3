//! Domain layer for the Tessera credential and session service.
//!
//! Holds the persistence-agnostic pieces: entity types, the error taxonomy
//! surfaced to callers, identity normalization, and the store traits that
//! the session manager composes.

pub mod error;
pub mod identity;
pub mod principal;
pub mod session;
pub mod store;
pub mod types;
