//! Fluent construction of [`Claims`].

use crate::jwt::claims::Claims;

/// Builder for token claims.
pub struct JwtBuilder {
    issuer: String,
    subject: Option<String>,
    audience: String,
    issued_at: Option<i64>,
    ttl_seconds: i64,
}

impl JwtBuilder {
    /// Builder for tokens from `issuer`.
    pub fn new(issuer: String) -> Self {
        JwtBuilder {
            issuer,
            subject: None,
            audience: String::new(),
            issued_at: None,
            ttl_seconds: 900, // 15 minutes default
        }
    }

    /// Set `sub`.
    pub fn subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Set `aud`.
    pub fn audience(mut self, audience: String) -> Self {
        self.audience = audience;
        self
    }

    /// Pin `iat`; defaults to the current time at `build`.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    /// Token lifetime, `exp - iat`.
    pub fn ttl_seconds(mut self, ttl: i64) -> Self {
        self.ttl_seconds = ttl;
        self
    }

    /// Build the claims.
    ///
    /// # Errors
    ///
    /// Fails without a subject, with a non-positive TTL, or when `exp` does
    /// not fit in an `i64`.
    pub fn build(self) -> Result<Claims, &'static str> {
        let subject = self.subject.ok_or("Subject is required")?;
        if self.ttl_seconds <= 0 {
            return Err("TTL must be positive");
        }
        let issued_at = self.issued_at.unwrap_or_else(|| chrono::Utc::now().timestamp());
        let expires_at = issued_at
            .checked_add(self.ttl_seconds)
            .ok_or("Token expiry out of range")?;

        Ok(Claims::new(
            self.issuer,
            subject,
            self.audience,
            issued_at,
            expires_at,
        ))
    }
}
