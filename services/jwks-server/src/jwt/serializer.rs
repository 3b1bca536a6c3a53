//! Compact JWS encoding and decoding.

use crate::error::KeyServiceError;
use crate::jwt::claims::Claims;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Signs and verifies tokens with a fixed algorithm.
pub struct JwtSerializer {
    /// Signature algorithm
    pub algorithm: Algorithm,
}

impl JwtSerializer {
    /// RS256 serializer.
    pub fn rs256() -> Self {
        JwtSerializer { algorithm: Algorithm::RS256 }
    }

    /// Sign `claims` into a compact token; the header carries `typ: JWT` and `kid`.
    pub fn serialize(&self, claims: &Claims, key: &EncodingKey, key_id: &str) -> Result<String, KeyServiceError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(key_id.to_string());

        encode(&header, claims, key).map_err(|e| KeyServiceError::signing(e.to_string()))
    }

    /// Verify signature, `exp` and `aud`, returning the claims.
    pub fn deserialize(&self, token: &str, key: &DecodingKey, audience: &str) -> Result<Claims, KeyServiceError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.set_audience(&[audience]);

        let token_data = decode::<Claims>(token, key, &validation)
            .map_err(|e| KeyServiceError::internal(format!("JWT decoding error: {e}")))?;

        Ok(token_data.claims)
    }

    /// Header of `token` without checking the signature.
    pub fn header_unverified(token: &str) -> Result<Header, KeyServiceError> {
        decode_header(token).map_err(|e| KeyServiceError::internal(format!("JWT decoding error: {e}")))
    }

    /// Claims of `token` without checking the signature or expiry.
    pub fn deserialize_unverified(token: &str) -> Result<Claims, KeyServiceError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(KeyServiceError::internal("Invalid token format"));
        }

        let payload = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            parts[1],
        )
        .map_err(|e| KeyServiceError::internal(e.to_string()))?;

        serde_json::from_slice(&payload).map_err(|e| KeyServiceError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::builder::JwtBuilder;

    #[test]
    fn test_round_trip_hs256() {
        let serializer = JwtSerializer { algorithm: Algorithm::HS256 };
        let secret = b"test-secret-key-for-testing-only";

        let claims = JwtBuilder::new("test-issuer".to_string())
            .subject("user-123".to_string())
            .audience("api".to_string())
            .ttl_seconds(3600)
            .build()
            .unwrap();

        let token = serializer
            .serialize(&claims, &EncodingKey::from_secret(secret), "key-1")
            .unwrap();
        let decoded = serializer
            .deserialize(&token, &DecodingKey::from_secret(secret), "api")
            .unwrap();
        assert_eq!(claims, decoded);

        let header = JwtSerializer::header_unverified(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("key-1"));
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(JwtSerializer::deserialize_unverified(&token).unwrap(), claims);
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let serializer = JwtSerializer { algorithm: Algorithm::HS256 };
        let secret = b"test-secret-key-for-testing-only";
        let claims = JwtBuilder::new("i".to_string())
            .subject("s".to_string())
            .audience("api".to_string())
            .build()
            .unwrap();

        let token = serializer
            .serialize(&claims, &EncodingKey::from_secret(secret), "k")
            .unwrap();
        assert!(serializer
            .deserialize(&token, &DecodingKey::from_secret(secret), "other")
            .is_err());
    }

    #[test]
    fn test_unverified_rejects_malformed() {
        assert!(JwtSerializer::deserialize_unverified("a.b").is_err());
        assert!(JwtSerializer::header_unverified("garbage").is_err());
    }
}
