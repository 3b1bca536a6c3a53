//! RSA signing key material.
//!
//! Keys are stored as PKCS#1 PEM. PKCS#8 PEM is accepted on decode so that
//! keys imported by other tooling still load.

use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};

use crate::crypto::encoding::int_to_base64url;
use crate::error::{KeyServiceError, Result};
use crate::jwks::Jwk;

/// Modulus size of generated keys.
pub const KEY_BITS: usize = 2048;

/// Public exponent of generated keys.
pub const PUBLIC_EXPONENT: u32 = 65537;

/// An RSA private key usable for RS256 signing.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    inner: RsaPrivateKey,
}

impl KeyMaterial {
    /// Generate a fresh key from the OS CSPRNG.
    ///
    /// This is CPU bound (hundreds of milliseconds); call it from a blocking
    /// context.
    ///
    /// # Errors
    ///
    /// Returns `KeyGeneration` if the primitive fails.
    pub fn generate() -> Result<Self> {
        let exponent = BigUint::from(PUBLIC_EXPONENT);
        let inner = RsaPrivateKey::new_with_exp(&mut OsRng, KEY_BITS, &exponent)
            .map_err(|e| KeyServiceError::key_generation(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Serialize to PKCS#1 PEM bytes for storage.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the encoder fails, which only happens for keys
    /// that could not have been constructed through this type.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let pem = self
            .inner
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyServiceError::internal(format!("PKCS#1 encoding failed: {e}")))?;
        Ok(pem.as_bytes().to_vec())
    }

    /// Load a key from stored bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyDecode` if the bytes are not a PEM encoded RSA private key
    /// or the decoded key fails its consistency check.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let pem = std::str::from_utf8(bytes)
            .map_err(|_| KeyServiceError::key_decode("key bytes are not PEM text"))?;

        let inner = match RsaPrivateKey::from_pkcs1_pem(pem) {
            Ok(key) => key,
            Err(pkcs1_err) => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|_| {
                KeyServiceError::key_decode(format!("not an RSA private key: {pkcs1_err}"))
            })?,
        };

        inner
            .validate()
            .map_err(|e| KeyServiceError::key_decode(format!("inconsistent RSA key: {e}")))?;

        Ok(Self { inner })
    }

    /// RSA modulus `n`.
    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        self.inner.n()
    }

    /// RSA public exponent `e`.
    #[must_use]
    pub fn public_exponent(&self) -> &BigUint {
        self.inner.e()
    }

    /// RSA private exponent `d`.
    #[must_use]
    pub fn private_exponent(&self) -> &BigUint {
        self.inner.d()
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Public JWK for this key under the given key id.
    #[must_use]
    pub fn to_public_jwk(&self, kid: impl Into<String>) -> Jwk {
        Jwk::rsa_signing_key(
            kid,
            int_to_base64url(self.modulus()),
            int_to_base64url(self.public_exponent()),
        )
    }
}

impl From<RsaPrivateKey> for KeyMaterial {
    fn from(inner: RsaPrivateKey) -> Self {
        Self { inner }
    }
}

// Never print private components.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}
