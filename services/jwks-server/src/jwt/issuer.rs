//! Bearer token issuance.
//!
//! A token is signed by exactly one stored key: the valid key closest to
//! expiry, or on request the most recently expired key. The clock is read
//! once per issuance and the same instant drives key selection and `iat`.

use jsonwebtoken::EncodingKey;
use tracing::{info, warn};

use crate::config::{Config, ExpiredTokenPolicy};
use crate::error::{KeyClass, KeyServiceError, Result};
use crate::jwt::{JwtBuilder, JwtSerializer};
use crate::metrics;
use crate::storage::{unix_now, SharedKeyStore, SigningKey};

/// A signed token plus informational metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact JWS.
    pub token: String,
    /// Id of the signing key (`kid` header).
    pub kid: i64,
    /// Expiry of the signing key.
    pub key_expires_at: i64,
    /// `iat` claim.
    pub issued_at: i64,
    /// `exp` claim.
    pub expires_at: i64,
    /// Class of the signing key.
    pub key_class: KeyClass,
}

/// Selects a signing key and produces RS256 tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    store: SharedKeyStore,
    issuer: String,
    audience: String,
    ttl_seconds: i64,
    expired_policy: ExpiredTokenPolicy,
}

impl TokenIssuer {
    /// Issuer with a 15 minute token lifetime and the key-only policy.
    #[must_use]
    pub fn new(store: SharedKeyStore, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            store,
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_seconds: 900,
            expired_policy: ExpiredTokenPolicy::KeyOnly,
        }
    }

    /// Issuer configured from [`Config`].
    #[must_use]
    pub fn from_config(store: SharedKeyStore, config: &Config) -> Self {
        let ttl = i64::try_from(config.access_token_ttl.as_secs()).unwrap_or(i64::MAX);
        Self::new(store, config.jwt_issuer.clone(), config.jwt_audience.clone())
            .with_ttl_seconds(ttl)
            .with_expired_policy(config.expired_token_policy)
    }

    /// Set the token lifetime.
    #[must_use]
    pub const fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Set how expired-key tokens are dated.
    #[must_use]
    pub const fn with_expired_policy(mut self, policy: ExpiredTokenPolicy) -> Self {
        self.expired_policy = policy;
        self
    }

    /// Issue a token for `subject`.
    ///
    /// # Errors
    ///
    /// - `NoKeyAvailable` when no key of the requested class exists.
    /// - `Signing` when the stored key cannot be loaded or signing fails.
    /// - `Storage` when the key store fails.
    pub async fn issue(&self, use_expired_key: bool, subject: &str) -> Result<IssuedToken> {
        let class = KeyClass::from_expired_flag(use_expired_key);
        match self.issue_with_class(class, subject).await {
            Ok(issued) => {
                metrics::record_token_issued(class.as_str());
                info!(
                    kid = issued.kid,
                    key_class = %class,
                    key_expires_at = issued.key_expires_at,
                    exp = issued.expires_at,
                    "Issued token"
                );
                Ok(issued)
            }
            Err(err) => {
                metrics::record_issue_failure(err.code());
                warn!(key_class = %class, error = %err, "Token issuance failed");
                Err(err)
            }
        }
    }

    async fn issue_with_class(&self, class: KeyClass, subject: &str) -> Result<IssuedToken> {
        let now = unix_now();
        let key = match class {
            KeyClass::Valid => self.store.select_valid_at(now).await?,
            KeyClass::Expired => self.store.select_expired_at(now).await?,
        }
        .ok_or(KeyServiceError::no_key(class))?;

        let issued_at = self.issued_at(class, &key, now)?;
        let claims = JwtBuilder::new(self.issuer.clone())
            .subject(subject.to_string())
            .audience(self.audience.clone())
            .issued_at(issued_at)
            .ttl_seconds(self.ttl_seconds)
            .build()
            .map_err(KeyServiceError::internal)?;

        let encoding_key = EncodingKey::from_rsa_pem(&key.material)
            .map_err(|e| KeyServiceError::signing(format!("cannot load key {}: {e}", key.id)))?;
        let token = JwtSerializer::rs256().serialize(&claims, &encoding_key, &key.kid())?;

        Ok(IssuedToken {
            token,
            kid: key.id,
            key_expires_at: key.expires_at,
            issued_at: claims.iat,
            expires_at: claims.exp,
            key_class: class,
        })
    }

    fn issued_at(&self, class: KeyClass, key: &SigningKey, now: i64) -> Result<i64> {
        match (class, self.expired_policy) {
            // exp lands exactly on the key's expiry.
            (KeyClass::Expired, ExpiredTokenPolicy::Backdate) => key
                .expires_at
                .checked_sub(self.ttl_seconds)
                .ok_or_else(|| KeyServiceError::internal("backdated iat out of range")),
            _ => Ok(now),
        }
    }
}
