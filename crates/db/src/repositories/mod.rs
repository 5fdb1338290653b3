//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod principal_repo;
pub mod session_repo;

pub use principal_repo::PrincipalRepo;
pub use session_repo::SessionRepo;
