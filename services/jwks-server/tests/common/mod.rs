//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use jwks_server::crypto::KeyMaterial;
use jwks_server::storage::{MemoryKeyStore, SharedKeyStore};
use once_cell::sync::Lazy;

/// RSA keys generated once per test binary.
pub static TEST_KEYS: Lazy<Vec<KeyMaterial>> = Lazy::new(|| {
    (0..3)
        .map(|_| KeyMaterial::generate().expect("key generation"))
        .collect()
});

/// PEM encoding of `TEST_KEYS[index]`.
pub fn encoded_key(index: usize) -> Vec<u8> {
    TEST_KEYS[index].encode().expect("key encoding")
}

/// Memory store holding the given `(key index, expires_at)` entries, in order.
pub async fn memory_store_with(entries: &[(usize, i64)]) -> SharedKeyStore {
    let store: SharedKeyStore = Arc::new(MemoryKeyStore::new());
    for &(index, expires_at) in entries {
        store
            .insert(&encoded_key(index), expires_at)
            .await
            .expect("insert");
    }
    store
}
