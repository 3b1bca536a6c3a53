//! Error types for the key service.
//!
//! Every failure that can reach a request boundary is a [`KeyServiceError`].
//! None of them are retried: selection and signing are deterministic given
//! the store contents.

use std::fmt;
use thiserror::Error;

/// Which validity class a selection asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Keys with `expires_at > now`.
    Valid,
    /// Keys with `expires_at <= now`.
    Expired,
}

impl KeyClass {
    /// Class requested by the `expired` flag of an issuance request.
    #[must_use]
    pub const fn from_expired_flag(use_expired_key: bool) -> Self {
        if use_expired_key {
            Self::Expired
        } else {
            Self::Valid
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by key management, issuance and publication.
#[derive(Error, Debug)]
pub enum KeyServiceError {
    /// Stored bytes are not a well-formed private key.
    #[error("Key decode error: {0}")]
    KeyDecode(String),

    /// No stored key matches the requested validity class.
    #[error("No {class} signing key available")]
    NoKeyAvailable {
        /// The class that was requested
        class: KeyClass,
    },

    /// The signing primitive rejected the key or payload.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Key generation failed (entropy or primitive unavailable).
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// The key store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KeyServiceError {
    /// Create a key decode error.
    #[must_use]
    pub fn key_decode(msg: impl Into<String>) -> Self {
        Self::KeyDecode(msg.into())
    }

    /// Create a no-key-available error for the given class.
    #[must_use]
    pub const fn no_key(class: KeyClass) -> Self {
        Self::NoKeyAvailable { class }
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create a key generation error.
    #[must_use]
    pub fn key_generation(msg: impl Into<String>) -> Self {
        Self::KeyGeneration(msg.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for responses and metrics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KeyDecode(_) => KEY_DECODE_ERROR,
            Self::NoKeyAvailable { .. } => NO_KEY_AVAILABLE,
            Self::Signing(_) => SIGNING_ERROR,
            Self::KeyGeneration(_) => KEY_GENERATION_ERROR,
            Self::Storage(_) => STORAGE_ERROR,
            Self::Config(_) => CONFIG_ERROR,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// Message safe to return to a client.
    ///
    /// Decode and signing details can quote parser output derived from key
    /// bytes, so only the category is exposed for those.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::NoKeyAvailable { .. } => self.to_string(),
            Self::KeyDecode(_) => "Stored signing key could not be decoded".to_string(),
            Self::Signing(_) => "Token signing failed".to_string(),
            Self::Storage(_) => "Key store unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<sqlx::Error> for KeyServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for KeyServiceError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

impl From<tokio::task::JoinError> for KeyServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T, E = KeyServiceError> = std::result::Result<T, E>;

// Error codes for HTTP responses
/// Stored key bytes could not be decoded.
pub const KEY_DECODE_ERROR: &str = "KEY_DECODE_ERROR";
/// No key of the requested class exists.
pub const NO_KEY_AVAILABLE: &str = "NO_KEY_AVAILABLE";
/// Token signing failed.
pub const SIGNING_ERROR: &str = "SIGNING_ERROR";
/// RSA key generation failed.
pub const KEY_GENERATION_ERROR: &str = "KEY_GENERATION_ERROR";
/// The key store failed.
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
/// Invalid configuration.
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
/// Any other internal failure.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
