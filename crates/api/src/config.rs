use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use axum::http::HeaderValue;

use crate::auth::jwt::JwtConfig;

/// Default retention for revoked/expired session rows before they are purged.
const DEFAULT_SESSION_RETENTION_HOURS: i64 = 24;
/// Upper bound for `SESSION_RETENTION_HOURS` (one year).
const MAX_SESSION_RETENTION_HOURS: i64 = 24 * 365;

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. When unset the in-memory store backend is used.
    pub database_url: Option<String>,
    /// How long revoked or expired sessions are kept before purging (default: `24`).
    pub session_retention_hours: i64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `DATABASE_URL`            | unset (in-memory stores)   |
    /// | `SESSION_RETENTION_HOURS` | `24`                       |
    ///
    /// See [`JwtConfig::from_vars`] for the token settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                reason: format!("'{origin}': {e}"),
            })?;
        }

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let session_retention_hours = parse_in_range(
            &lookup,
            "SESSION_RETENTION_HOURS",
            DEFAULT_SESSION_RETENTION_HOURS,
            0..=MAX_SESSION_RETENTION_HOURS,
        )?;

        let jwt = JwtConfig::from_vars(&lookup)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            session_retention_hours,
            jwt,
        })
    }
}

/// Parse `var` if present, otherwise fall back to `default`.
pub(crate) fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Like [`parse_or`], but the value must also fall inside `range`.
pub(crate) fn parse_in_range<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Display,
    T::Err: Display,
{
    let value = parse_or(lookup, var, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("must be between {} and {}", range.start(), range.end()),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = ServerConfig::from_vars(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.database_url.is_none());
        assert_eq!(config.session_retention_hours, 24);
        assert_eq!(config.jwt.access_token_expiry_mins, 15);
        assert_eq!(config.jwt.refresh_token_expiry_days, 7);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = ServerConfig::from_vars(lookup_from(&[]));
        assert_matches!(result, Err(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn invalid_port_is_reported() {
        let result =
            ServerConfig::from_vars(lookup_from(&[("JWT_SECRET", "s"), ("PORT", "eighty")]));
        assert_matches!(result, Err(ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = ServerConfig::from_vars(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,,"),
            ("DATABASE_URL", "postgres://localhost/tessera"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/tessera")
        );
    }

    #[test]
    fn retention_hours_must_be_in_range() {
        for bad in ["-200", "-1", "8761", "9223372036854775807"] {
            let result = ServerConfig::from_vars(lookup_from(&[
                ("JWT_SECRET", "s"),
                ("SESSION_RETENTION_HOURS", bad),
            ]));
            assert_matches!(
                result,
                Err(ConfigError::Invalid { var: "SESSION_RETENTION_HOURS", .. }),
                "{bad}"
            );
        }

        let config = ServerConfig::from_vars(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("SESSION_RETENTION_HOURS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.session_retention_hours, 0);
    }
}
