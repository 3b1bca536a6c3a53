//! Startup seeding of the key store.
//!
//! A store with no keys at all gets one already-expired key and one valid
//! key, so both the normal and the expired-key issuance paths work right
//! after the first start. A store that already holds any key is left alone.

use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::crypto::KeyMaterial;
use crate::error::{KeyServiceError, Result};
use crate::metrics;
use crate::storage::{unix_now, SharedKeyStore};

/// What [`Bootstrapper::ensure_seeded`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already had keys.
    AlreadySeeded,
    /// Two keys were inserted.
    Seeded {
        /// Id of the expired key
        expired_kid: i64,
        /// Id of the valid key
        valid_kid: i64,
    },
}

/// Seeds an empty key store.
pub struct Bootstrapper {
    store: SharedKeyStore,
    valid_lifetime_secs: i64,
    expired_offset_secs: i64,
}

impl Bootstrapper {
    /// Seed with a key valid for `valid_lifetime` and one that expired
    /// `expired_offset` ago.
    #[must_use]
    pub fn new(store: SharedKeyStore, valid_lifetime: Duration, expired_offset: Duration) -> Self {
        Self {
            store,
            valid_lifetime_secs: secs(valid_lifetime),
            expired_offset_secs: secs(expired_offset),
        }
    }

    /// Bootstrapper configured from [`Config`].
    #[must_use]
    pub fn from_config(store: SharedKeyStore, config: &Config) -> Self {
        Self::new(store, config.seed_valid_lifetime, config.seed_expired_offset)
    }

    /// Seed the store if it has neither a valid nor an expired key.
    ///
    /// # Errors
    ///
    /// Returns `KeyGeneration` or `Storage` errors, or `Internal` if the
    /// configured durations push an expiry out of range. All are fatal at
    /// startup.
    pub async fn ensure_seeded(&self) -> Result<SeedOutcome> {
        let now = unix_now();
        let has_valid = self.store.select_valid_at(now).await?.is_some();
        let has_expired = self.store.select_expired_at(now).await?.is_some();
        if has_valid || has_expired {
            info!(key_count = self.store.len().await?, "Key store already seeded");
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let expired_at = now
            .checked_sub(self.expired_offset_secs)
            .ok_or_else(|| KeyServiceError::internal("seed expiry out of range"))?;
        let valid_until = now
            .checked_add(self.valid_lifetime_secs)
            .ok_or_else(|| KeyServiceError::internal("seed lifetime out of range"))?;

        let expired = generate_encoded().await?;
        let valid = generate_encoded().await?;

        // Both keys or neither.
        let ids = self
            .store
            .insert_many(&[(expired.as_slice(), expired_at), (valid.as_slice(), valid_until)])
            .await?;
        let (expired_kid, valid_kid) = match ids[..] {
            [expired_kid, valid_kid] => (expired_kid, valid_kid),
            _ => return Err(KeyServiceError::internal("seed insert returned wrong id count")),
        };

        info!(expired_kid, valid_kid, "Seeded key store with one expired and one valid key");
        Ok(SeedOutcome::Seeded {
            expired_kid,
            valid_kid,
        })
    }
}

/// Generate a key on the blocking pool and return its storage encoding.
///
/// # Errors
///
/// Returns `KeyGeneration` if generation fails.
pub async fn generate_encoded() -> Result<Vec<u8>> {
    let encoded = tokio::task::spawn_blocking(|| KeyMaterial::generate()?.encode()).await??;
    metrics::record_key_generated();
    Ok(encoded)
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyStore, MemoryKeyStore, SigningKey};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store whose next batch write fails once.
    struct FailingBatchStore {
        inner: MemoryKeyStore,
        fail_next_batch: AtomicBool,
    }

    #[async_trait]
    impl KeyStore for FailingBatchStore {
        async fn insert(&self, material: &[u8], expires_at: i64) -> Result<i64> {
            self.inner.insert(material, expires_at).await
        }

        async fn insert_many(&self, keys: &[(&[u8], i64)]) -> Result<Vec<i64>> {
            if self.fail_next_batch.swap(false, Ordering::SeqCst) {
                return Err(KeyServiceError::storage("disk full"));
            }
            self.inner.insert_many(keys).await
        }

        async fn select_valid_at(&self, now: i64) -> Result<Option<SigningKey>> {
            self.inner.select_valid_at(now).await
        }

        async fn select_expired_at(&self, now: i64) -> Result<Option<SigningKey>> {
            self.inner.select_expired_at(now).await
        }

        async fn select_all_valid_at(&self, now: i64) -> Result<Vec<SigningKey>> {
            self.inner.select_all_valid_at(now).await
        }

        async fn len(&self) -> Result<usize> {
            self.inner.len().await
        }
    }

    #[tokio::test]
    async fn test_failed_seed_write_is_retried_on_next_start() {
        let store = Arc::new(FailingBatchStore {
            inner: MemoryKeyStore::new(),
            fail_next_batch: AtomicBool::new(true),
        });
        let bootstrapper = Bootstrapper::new(
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(5),
        );

        let err = bootstrapper.ensure_seeded().await.unwrap_err();
        assert!(matches!(err, KeyServiceError::Storage(_)));
        assert!(store.is_empty().await.unwrap());

        let outcome = bootstrapper.ensure_seeded().await.unwrap();
        assert!(matches!(outcome, SeedOutcome::Seeded { .. }));
        assert!(store.select_valid().await.unwrap().is_some());
        assert!(store.select_expired().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_fails_before_generating() {
        let store = Arc::new(MemoryKeyStore::new());
        let bootstrapper = Bootstrapper::new(
            store.clone(),
            Duration::from_secs(u64::MAX),
            Duration::from_secs(5),
        );

        let err = bootstrapper.ensure_seeded().await.unwrap_err();
        assert!(matches!(err, KeyServiceError::Internal(_)));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_expired_key_prevents_seeding() {
        let store = Arc::new(MemoryKeyStore::new());
        store.insert(b"old", unix_now() - 100).await.unwrap();

        let bootstrapper = Bootstrapper::new(
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(5),
        );
        assert_eq!(bootstrapper.ensure_seeded().await.unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[test]
    fn test_secs_saturates() {
        assert_eq!(secs(Duration::from_secs(5)), 5);
        assert_eq!(secs(Duration::from_secs(u64::MAX)), i64::MAX);
    }
}
