//! Centralized configuration for the JWKS server.
//!
//! All configuration is loaded from environment variables (optionally via a
//! `.env` file) and validated at startup.

use crate::error::KeyServiceError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Database path that selects the in-process memory store.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Upper bound for lifetimes and offsets given in seconds (ten years).
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// How tokens signed with an expired key are dated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiredTokenPolicy {
    /// Only the signing key is expired; the token keeps the normal window.
    KeyOnly,
    /// The token expires together with its signing key.
    Backdate,
}

impl ExpiredTokenPolicy {
    /// Parse policy from string.
    pub fn from_str(s: &str) -> Result<Self, KeyServiceError> {
        match s.to_lowercase().as_str() {
            "key-only" | "key_only" => Ok(Self::KeyOnly),
            "backdate" => Ok(Self::Backdate),
            _ => Err(KeyServiceError::config(format!("Invalid EXPIRED_TOKEN_POLICY: {}", s))),
        }
    }

    /// Name as accepted by [`ExpiredTokenPolicy::from_str`].
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeyOnly => "key-only",
            Self::Backdate => "backdate",
        }
    }
}

/// Key store backend selected by `DATABASE_PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite database file
    Sqlite(PathBuf),
    /// Process memory, lost on restart
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Time allowed for in-flight requests on shutdown
    pub shutdown_timeout: Duration,

    // Storage
    /// Key store backend
    pub store: StoreBackend,

    // JWT settings
    /// `iss` claim
    pub jwt_issuer: String,
    /// `aud` claim
    pub jwt_audience: String,
    /// Token lifetime (`exp - iat`)
    pub access_token_ttl: Duration,
    /// Dating of tokens signed with an expired key
    pub expired_token_policy: ExpiredTokenPolicy,
    /// Subject used when a request names none
    pub default_subject: String,

    // Bootstrap
    /// Lifetime of the seeded valid key
    pub seed_valid_lifetime: Duration,
    /// How long before startup the seeded expired key expired
    pub seed_expired_offset: Duration,

    // Logging
    /// Log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: Duration::from_secs(10),
            store: StoreBackend::Sqlite(PathBuf::from("totally_not_my_privateKeys.db")),
            jwt_issuer: "jwks-sqlite-demo".to_string(),
            jwt_audience: "example-aud".to_string(),
            access_token_ttl: Duration::from_secs(900),
            expired_token_policy: ExpiredTokenPolicy::KeyOnly,
            default_subject: "userABC".to_string(),
            seed_valid_lifetime: Duration::from_secs(3600),
            seed_expired_offset: Duration::from_secs(5),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, KeyServiceError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = parse_env("PORT", defaults.port)?;
        let shutdown_timeout = Duration::from_secs(parse_env("SHUTDOWN_TIMEOUT", 10)?);

        let store = match env::var("DATABASE_PATH") {
            Ok(path) if path == MEMORY_DATABASE => StoreBackend::Memory,
            Ok(path) if path.trim().is_empty() => {
                return Err(KeyServiceError::config("DATABASE_PATH must not be empty"))
            }
            Ok(path) => StoreBackend::Sqlite(PathBuf::from(path)),
            Err(_) => defaults.store,
        };

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer);
        let jwt_audience = env::var("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience);
        let access_token_ttl = Duration::from_secs(positive_env("ACCESS_TOKEN_TTL", 900)?);
        let expired_token_policy = ExpiredTokenPolicy::from_str(
            &env::var("EXPIRED_TOKEN_POLICY").unwrap_or_else(|_| "key-only".to_string()),
        )?;
        let default_subject = env::var("DEFAULT_SUBJECT").unwrap_or(defaults.default_subject);

        let seed_valid_lifetime =
            Duration::from_secs(positive_env("SEED_VALID_LIFETIME_SECS", 3600)?);
        let seed_expired_offset =
            Duration::from_secs(positive_env("SEED_EXPIRED_OFFSET_SECS", 5)?);

        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);
        let log_json = parse_env("LOG_JSON", false)?;

        Ok(Self {
            host,
            port,
            shutdown_timeout,
            store,
            jwt_issuer,
            jwt_audience,
            access_token_ttl,
            expired_token_policy,
            default_subject,
            seed_valid_lifetime,
            seed_expired_offset,
            log_level,
            log_json,
        })
    }

    /// Address string for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, KeyServiceError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| KeyServiceError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// Parse a duration in seconds in `1..=MAX_DURATION_SECS`.
fn positive_env(name: &str, default: u64) -> Result<u64, KeyServiceError> {
    let value = parse_env(name, default)?;
    if value == 0 {
        return Err(KeyServiceError::config(format!("{} must be greater than zero", name)));
    }
    if value > MAX_DURATION_SECS {
        return Err(KeyServiceError::config(format!(
            "{} must be at most {} seconds",
            name, MAX_DURATION_SECS
        )));
    }
    Ok(value)
}
