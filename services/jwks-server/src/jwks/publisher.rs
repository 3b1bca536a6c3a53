//! JWKS document model and publication from the key store.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::Result;
use crate::metrics;
use crate::storage::{SharedKeyStore, SigningKey};

/// A public RSA signing key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always `RSA`
    pub kty: String,
    /// Algorithm, always `RS256`
    pub alg: String,
    /// Intended use, always `sig`
    #[serde(rename = "use")]
    pub key_use: String,
    /// Store id of the key
    pub kid: String,
    /// Modulus, base64url
    pub n: String,
    /// Public exponent, base64url
    pub e: String,
}

impl Jwk {
    /// RS256 signature key with the given base64url components.
    pub fn rsa_signing_key(kid: impl Into<String>, n: String, e: String) -> Self {
        Jwk {
            kty: "RSA".to_string(),
            alg: "RS256".to_string(),
            key_use: "sig".to_string(),
            kid: kid.into(),
            n,
            e,
        }
    }
}

/// JSON Web Key Set as served at `/.well-known/jwks.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys, soonest expiry first
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Empty key set.
    pub fn new() -> Self {
        Jwks { keys: Vec::new() }
    }

    /// Append a key.
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// Key with the given `kid`, if published.
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Compact JSON document.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Builds the public key set from the key store.
///
/// Publication never caches: each call reflects the store at that moment.
#[derive(Clone)]
pub struct JwksPublisher {
    store: SharedKeyStore,
}

impl JwksPublisher {
    /// Publisher over `store`.
    #[must_use]
    pub fn new(store: SharedKeyStore) -> Self {
        JwksPublisher { store }
    }

    /// Publish every key currently valid.
    pub async fn current(&self) -> Result<Jwks> {
        let keys = self.store.select_all_valid().await?;
        let jwks = Self::publish(&keys)?;

        metrics::record_jwks_published(jwks.keys.len());
        debug!(key_count = jwks.keys.len(), "Published JWKS");

        Ok(jwks)
    }

    /// Convert keys to public JWKs, preserving order.
    ///
    /// No filtering happens here. A single undecodable key fails the whole
    /// set rather than publishing a partial one.
    pub fn publish(keys: &[SigningKey]) -> Result<Jwks> {
        let mut jwks = Jwks::new();
        for key in keys {
            let material = key.decode().map_err(|e| {
                error!(kid = key.id, error = %e, "Stored signing key failed to decode");
                e
            })?;
            jwks.add_key(material.to_public_jwk(key.kid()));
        }
        Ok(jwks)
    }
}
