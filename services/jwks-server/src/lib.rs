//! JWKS server library.
//!
//! Stores RSA signing keys with expiry timestamps, publishes the currently
//! valid public keys as a JWKS, and issues RS256 tokens signed with either
//! the valid key or the most recently expired one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http;
pub mod jwks;
pub mod jwt;
pub mod metrics;
pub mod observability;
pub mod shutdown;
pub mod storage;

// Re-exports for convenience
pub use config::Config;
pub use error::KeyServiceError;
