/// Session rows use PostgreSQL BIGSERIAL keys.
pub type DbId = i64;

/// Principals are keyed by an opaque, stable UUID.
pub type PrincipalId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
