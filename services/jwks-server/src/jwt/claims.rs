//! Registered claims carried by issued tokens.

use serde::{Deserialize, Serialize};

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued-at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Claims with a fresh random `jti`.
    pub fn new(issuer: String, subject: String, audience: String, issued_at: i64, expires_at: i64) -> Self {
        Claims {
            sub: subject,
            iss: issuer,
            aud: audience,
            iat: issued_at,
            exp: expires_at,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(
            "test-issuer".to_string(),
            "user-123".to_string(),
            "api".to_string(),
            1_000,
            1_900,
        );

        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_900);
    }

    #[test]
    fn test_jti_is_unique() {
        let a = Claims::new("i".to_string(), "s".to_string(), "a".to_string(), 0, 1);
        let b = Claims::new("i".to_string(), "s".to_string(), "a".to_string(), 0, 1);
        assert_ne!(a.jti, b.jti);
    }
}
