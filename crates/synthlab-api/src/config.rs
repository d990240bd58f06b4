//! Server configuration read from the environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Settings resolved once at startup.
#[derive(Clone)]
pub struct Settings {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// HMAC secret tokens are signed with.
    pub jwt_secret: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Upper bound on pooled connections.
    pub db_max_connections: u32,
    /// Lifetime of issued tokens.
    pub jwt_ttl: chrono::Duration,
    /// `iss` claim written to and required on tokens.
    pub jwt_issuer: String,
    /// Deadline for each persistence or revocation call.
    pub persistence_timeout: Duration,
    /// Directory reaction images are written to and served from.
    pub image_dir: PathBuf,
    /// Public prefix of image URLs.
    pub image_base_url: String,
    /// How often expired revocation records are purged.
    pub revocation_purge_interval: Duration,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otel_endpoint: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_ttl", &self.jwt_ttl)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("persistence_timeout", &self.persistence_timeout)
            .field("image_dir", &self.image_dir)
            .field("image_base_url", &self.image_base_url)
            .field("revocation_purge_interval", &self.revocation_purge_interval)
            .field("otel_endpoint", &self.otel_endpoint)
            .finish()
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn positive<T>(key: &str, value: T) -> Result<T, AppError>
where
    T: PartialOrd + Default,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(AppError::Config(format!("{key} must be greater than zero")))
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// As [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let jwt_ttl_seconds = positive(
            "JWT_TTL_SECONDS",
            parsed(&lookup, "JWT_TTL_SECONDS", 3600_i64)?,
        )?;
        let timeout_ms = positive(
            "PERSISTENCE_TIMEOUT_MS",
            parsed(&lookup, "PERSISTENCE_TIMEOUT_MS", 5000_u64)?,
        )?;
        let purge_secs = positive(
            "REVOCATION_PURGE_INTERVAL_SECS",
            parsed(&lookup, "REVOCATION_PURGE_INTERVAL_SECS", 300_u64)?,
        )?;

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(&lookup, "PORT", 3000)?,
            db_max_connections: positive(
                "DB_MAX_CONNECTIONS",
                parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            )?,
            jwt_ttl: chrono::Duration::seconds(jwt_ttl_seconds),
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "synthlab".to_owned()),
            persistence_timeout: Duration::from_millis(timeout_ms),
            image_dir: lookup("IMAGE_DIR")
                .map_or_else(|| PathBuf::from("./data/images"), PathBuf::from),
            image_base_url: lookup("IMAGE_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/images".to_owned()),
            revocation_purge_interval: Duration::from_secs(purge_secs),
            otel_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// `host:port` as configured.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/synthlab"),
        ("JWT_SECRET", "change-me"),
    ];

    #[test]
    fn test_defaults_apply_when_only_required_vars_are_set() {
        let settings = Settings::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 10);
        assert_eq!(settings.jwt_ttl, chrono::Duration::hours(1));
        assert_eq!(settings.jwt_issuer, "synthlab");
        assert_eq!(settings.persistence_timeout, Duration::from_secs(5));
        assert_eq!(settings.revocation_purge_interval, Duration::from_secs(300));
        assert!(settings.otel_endpoint.is_none());
    }

    #[test]
    fn test_missing_secret_fails() {
        let result = Settings::from_lookup(lookup_from(&REQUIRED[..1]));

        match result.unwrap_err() {
            AppError::Config(message) => assert!(message.contains("JWT_SECRET")),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_port_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));

        let result = Settings::from_lookup(lookup_from(&pairs));

        assert!(matches!(result.unwrap_err(), AppError::Config(_)));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PERSISTENCE_TIMEOUT_MS", "0"));

        let result = Settings::from_lookup(lookup_from(&pairs));

        assert!(matches!(result.unwrap_err(), AppError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = Settings::from_lookup(lookup_from(&REQUIRED)).unwrap();

        let rendered = format!("{settings:?}");

        assert!(!rendered.contains("change-me"));
        assert!(!rendered.contains("postgres://"));
    }
}
