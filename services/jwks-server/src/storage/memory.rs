//! In-memory key store for ephemeral deployments and tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::storage::{KeyStore, SigningKey};

#[derive(Default)]
struct Inner {
    last_id: i64,
    keys: Vec<SigningKey>,
}

/// Key store held entirely in process memory.
///
/// Ids start at 1 and are never reused. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryKeyStore {
    inner: RwLock<Inner>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn insert(&self, material: &[u8], expires_at: i64) -> Result<i64> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.keys.push(SigningKey {
            id,
            material: material.to_vec(),
            expires_at,
        });
        Ok(id)
    }

    async fn insert_many(&self, keys: &[(&[u8], i64)]) -> Result<Vec<i64>> {
        let mut inner = self.inner.write().await;
        let mut ids = Vec::with_capacity(keys.len());
        for &(material, expires_at) in keys {
            inner.last_id += 1;
            let id = inner.last_id;
            inner.keys.push(SigningKey {
                id,
                material: material.to_vec(),
                expires_at,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn select_valid_at(&self, now: i64) -> Result<Option<SigningKey>> {
        let inner = self.inner.read().await;
        Ok(inner
            .keys
            .iter()
            .filter(|k| k.is_valid_at(now))
            .min_by_key(|k| (k.expires_at, k.id))
            .cloned())
    }

    async fn select_expired_at(&self, now: i64) -> Result<Option<SigningKey>> {
        let inner = self.inner.read().await;
        Ok(inner
            .keys
            .iter()
            .filter(|k| !k.is_valid_at(now))
            .max_by_key(|k| (k.expires_at, k.id))
            .cloned())
    }

    async fn select_all_valid_at(&self, now: i64) -> Result<Vec<SigningKey>> {
        let inner = self.inner.read().await;
        let mut keys: Vec<SigningKey> = inner
            .keys
            .iter()
            .filter(|k| k.is_valid_at(now))
            .cloned()
            .collect();
        keys.sort_by_key(|k| (k.expires_at, k.id));
        Ok(keys)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryKeyStore::new();
        assert_eq!(store.insert(b"a", 10).await.unwrap(), 1);
        assert_eq!(store.insert(b"b", 20).await.unwrap(), 2);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_many_continues_id_sequence() {
        let store = MemoryKeyStore::new();
        store.insert(b"a", 10).await.unwrap();
        let ids = store
            .insert_many(&[(b"b".as_slice(), 20), (b"c".as_slice(), 30)])
            .await
            .unwrap();

        assert_eq!(ids, vec![2, 3]);
        assert_eq!(store.len().await.unwrap(), 3);
        assert_eq!(store.select_valid_at(25).await.unwrap().unwrap().material, b"c");
    }

    #[tokio::test]
    async fn test_selection_at_fixed_time() {
        let store = MemoryKeyStore::new();
        let old = store.insert(b"old", 50).await.unwrap();
        let recent = store.insert(b"recent", 90).await.unwrap();
        let soon = store.insert(b"soon", 150).await.unwrap();
        let late = store.insert(b"late", 300).await.unwrap();

        let now = 100;
        assert_eq!(store.select_valid_at(now).await.unwrap().unwrap().id, soon);
        assert_eq!(store.select_expired_at(now).await.unwrap().unwrap().id, recent);

        let ids: Vec<i64> = store
            .select_all_valid_at(now)
            .await
            .unwrap()
            .iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(ids, vec![soon, late]);
        assert_ne!(ids[0], old);
    }

    #[tokio::test]
    async fn test_key_expiring_now_is_expired() {
        let store = MemoryKeyStore::new();
        let id = store.insert(b"edge", 100).await.unwrap();

        assert!(store.select_valid_at(100).await.unwrap().is_none());
        assert_eq!(store.select_expired_at(100).await.unwrap().unwrap().id, id);
        assert_eq!(store.select_valid_at(99).await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_ties_break_by_id() {
        let store = MemoryKeyStore::new();
        let first = store.insert(b"a", 200).await.unwrap();
        let second = store.insert(b"b", 200).await.unwrap();
        let past_a = store.insert(b"c", 10).await.unwrap();
        let past_b = store.insert(b"d", 10).await.unwrap();

        assert_eq!(store.select_valid_at(100).await.unwrap().unwrap().id, first);
        assert_eq!(store.select_expired_at(100).await.unwrap().unwrap().id, past_b);
        assert_ne!(past_a, past_b);

        let all: Vec<i64> = store
            .select_all_valid_at(100)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn test_empty_store_selects_nothing() {
        let store = MemoryKeyStore::new();
        assert!(store.is_empty().await.unwrap());
        assert!(store.select_valid().await.unwrap().is_none());
        assert!(store.select_expired().await.unwrap().is_none());
        assert!(store.select_all_valid().await.unwrap().is_empty());
    }
}
