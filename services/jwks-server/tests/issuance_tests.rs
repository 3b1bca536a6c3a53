//! End-to-end tests for seeding and token issuance.

mod common;

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey};
use jwks_server::bootstrap::{Bootstrapper, SeedOutcome};
use jwks_server::config::ExpiredTokenPolicy;
use jwks_server::error::{KeyClass, KeyServiceError};
use jwks_server::jwks::JwksPublisher;
use jwks_server::jwt::{JwtSerializer, TokenIssuer};
use jwks_server::storage::{unix_now, MemoryKeyStore, SharedKeyStore};

use common::memory_store_with;

const ISSUER: &str = "jwks-sqlite-demo";
const AUDIENCE: &str = "example-aud";

fn issuer_for(store: SharedKeyStore) -> TokenIssuer {
    TokenIssuer::new(store, ISSUER, AUDIENCE)
}

#[tokio::test]
async fn test_bootstrap_seeds_one_valid_and_one_expired_key() {
    let store: SharedKeyStore = Arc::new(MemoryKeyStore::new());
    let before = unix_now();

    let outcome = Bootstrapper::new(store.clone(), Duration::from_secs(3600), Duration::from_secs(5))
        .ensure_seeded()
        .await
        .unwrap();
    let after = unix_now();

    let SeedOutcome::Seeded {
        expired_kid,
        valid_kid,
    } = outcome
    else {
        panic!("expected seeding, got {outcome:?}");
    };

    let valid = store.select_valid().await.unwrap().unwrap();
    assert_eq!(valid.id, valid_kid);
    assert!(valid.expires_at >= before + 3600 && valid.expires_at <= after + 3600);

    let expired = store.select_expired().await.unwrap().unwrap();
    assert_eq!(expired.id, expired_kid);
    assert!(expired.expires_at >= before - 5 && expired.expires_at <= after - 5);

    assert_eq!(store.select_all_valid().await.unwrap().len(), 1);
    assert_eq!(store.len().await.unwrap(), 2);

    // Both seeded keys decode.
    valid.decode().unwrap();
    expired.decode().unwrap();
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let store = memory_store_with(&[(0, unix_now() + 3600)]).await;
    let bootstrapper =
        Bootstrapper::new(store.clone(), Duration::from_secs(3600), Duration::from_secs(5));

    assert_eq!(bootstrapper.ensure_seeded().await.unwrap(), SeedOutcome::AlreadySeeded);
    assert_eq!(bootstrapper.ensure_seeded().await.unwrap(), SeedOutcome::AlreadySeeded);
    assert_eq!(store.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_issue_with_valid_key() {
    let now = unix_now();
    let store = memory_store_with(&[(0, now - 5), (1, now + 3600), (2, now + 7200)]).await;
    let issuer = issuer_for(store.clone());

    let issued = issuer.issue(false, "alice").await.unwrap();
    let selected = store.select_valid().await.unwrap().unwrap();

    let header = JwtSerializer::header_unverified(&issued.token).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid, Some(selected.kid()));
    assert_eq!(issued.kid, selected.id);
    assert_eq!(issued.key_class, KeyClass::Valid);

    let jwk = selected.decode().unwrap().to_public_jwk(selected.kid());
    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).unwrap();
    let claims = JwtSerializer::rs256()
        .deserialize(&issued.token, &decoding_key, AUDIENCE)
        .unwrap();

    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.aud, AUDIENCE);
    assert_eq!(claims.exp - claims.iat, 900);
    assert!(claims.iat >= now);
    assert!(!claims.jti.is_empty());
}

#[tokio::test]
async fn test_issue_with_expired_key() {
    let now = unix_now();
    let store = memory_store_with(&[(0, now - 50), (1, now - 5), (2, now + 3600)]).await;
    let issuer = issuer_for(store.clone());

    let issued = issuer.issue(true, "bob").await.unwrap();
    let selected = store.select_expired().await.unwrap().unwrap();

    assert_eq!(issued.kid, selected.id);
    assert_eq!(issued.key_expires_at, now - 5);
    assert_eq!(issued.key_class, KeyClass::Expired);

    // Key-only policy keeps the normal validity window.
    let claims = JwtSerializer::deserialize_unverified(&issued.token).unwrap();
    assert_eq!(claims.sub, "bob");
    assert_eq!(claims.exp - claims.iat, 900);
    assert!(claims.exp > now);

    // The expired key is not published.
    let jwks = JwksPublisher::new(store).current().await.unwrap();
    assert!(jwks.find_key(&issued.kid.to_string()).is_none());
}

#[tokio::test]
async fn test_backdate_policy_expires_with_key() {
    let now = unix_now();
    let store = memory_store_with(&[(0, now - 5)]).await;
    let issuer = issuer_for(store).with_expired_policy(ExpiredTokenPolicy::Backdate);

    let issued = issuer.issue(true, "carol").await.unwrap();
    let claims = JwtSerializer::deserialize_unverified(&issued.token).unwrap();

    assert_eq!(claims.exp, now - 5);
    assert_eq!(claims.iat, now - 5 - 900);
    assert_eq!(issued.expires_at, claims.exp);
}

#[tokio::test]
async fn test_no_expired_key_available() {
    let store: SharedKeyStore = Arc::new(MemoryKeyStore::new());
    let err = issuer_for(store).issue(true, "alice").await.unwrap_err();

    assert!(matches!(
        err,
        KeyServiceError::NoKeyAvailable {
            class: KeyClass::Expired
        }
    ));
    assert_eq!(err.code(), "NO_KEY_AVAILABLE");
}

#[tokio::test]
async fn test_no_valid_key_when_only_expired_exist() {
    let store = memory_store_with(&[(0, unix_now() - 5)]).await;
    let err = issuer_for(store).issue(false, "alice").await.unwrap_err();

    assert!(matches!(
        err,
        KeyServiceError::NoKeyAvailable {
            class: KeyClass::Valid
        }
    ));
}

#[tokio::test]
async fn test_custom_ttl() {
    let store = memory_store_with(&[(0, unix_now() + 3600)]).await;
    let issued = issuer_for(store)
        .with_ttl_seconds(60)
        .issue(false, "alice")
        .await
        .unwrap();

    assert_eq!(issued.expires_at - issued.issued_at, 60);
}
