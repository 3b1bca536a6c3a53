//! Signing key storage.
//!
//! The store is insert-only: keys are never updated or deleted, so expired
//! keys stay selectable for the expired-key issuance path. Validity is
//! evaluated against `now` at selection time; every selection reads the clock
//! exactly once.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKeyStore;
pub use sqlite::SqliteKeyStore;

use async_trait::async_trait;
use std::sync::Arc;

use tracing::info;

use crate::config::StoreBackend;
use crate::crypto::KeyMaterial;
use crate::error::Result;

/// A stored signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    /// Store-assigned id, published as `kid`.
    pub id: i64,
    /// PKCS#1 PEM encoded private key.
    pub material: Vec<u8>,
    /// Unix timestamp (seconds) at which the key stops being valid.
    pub expires_at: i64,
}

impl SigningKey {
    /// Key id in the string form used for `kid`.
    #[must_use]
    pub fn kid(&self) -> String {
        self.id.to_string()
    }

    /// Whether the key is valid at `now` (`now < expires_at`).
    #[must_use]
    pub const fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }

    /// Decode the stored private key.
    ///
    /// # Errors
    ///
    /// Returns `KeyDecode` if the stored bytes are corrupt.
    pub fn decode(&self) -> Result<KeyMaterial> {
        KeyMaterial::decode(&self.material)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Current Unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Durable, timestamp-indexed key collection.
///
/// All operations are atomic with respect to each other.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Append a key and return its new id.
    ///
    /// The key is durable when this returns.
    async fn insert(&self, material: &[u8], expires_at: i64) -> Result<i64>;

    /// Append several `(material, expires_at)` keys in one atomic write.
    ///
    /// Either every key is stored or none is. Ids are returned in input order.
    async fn insert_many(&self, keys: &[(&[u8], i64)]) -> Result<Vec<i64>>;

    /// Valid key closest to expiry at `now`; ties go to the smaller id.
    async fn select_valid_at(&self, now: i64) -> Result<Option<SigningKey>>;

    /// Most recently expired key at `now`; ties go to the larger id.
    async fn select_expired_at(&self, now: i64) -> Result<Option<SigningKey>>;

    /// All keys valid at `now`, ascending by `expires_at` then id.
    async fn select_all_valid_at(&self, now: i64) -> Result<Vec<SigningKey>>;

    /// Number of stored keys, valid or not.
    async fn len(&self) -> Result<usize>;

    /// Release underlying resources. The store must not be used afterwards.
    async fn close(&self) {}

    /// [`select_valid_at`](Self::select_valid_at) against the system clock.
    async fn select_valid(&self) -> Result<Option<SigningKey>> {
        self.select_valid_at(unix_now()).await
    }

    /// [`select_expired_at`](Self::select_expired_at) against the system clock.
    async fn select_expired(&self) -> Result<Option<SigningKey>> {
        self.select_expired_at(unix_now()).await
    }

    /// [`select_all_valid_at`](Self::select_all_valid_at) against the system clock.
    async fn select_all_valid(&self) -> Result<Vec<SigningKey>> {
        self.select_all_valid_at(unix_now()).await
    }

    /// Whether the store holds no keys.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Shared handle to the process-wide key store.
pub type SharedKeyStore = Arc<dyn KeyStore>;

/// Open the store for `backend`.
///
/// # Errors
///
/// Returns `Storage` if the database cannot be opened.
pub async fn open_store(backend: &StoreBackend) -> Result<SharedKeyStore> {
    match backend {
        StoreBackend::Sqlite(path) => Ok(Arc::new(SqliteKeyStore::open(path).await?)),
        StoreBackend::Memory => {
            info!("Using in-memory key store; keys are lost on restart");
            Ok(Arc::new(MemoryKeyStore::new()))
        }
    }
}
