//! Public key set publication.

pub mod publisher;

pub use publisher::{Jwk, Jwks, JwksPublisher};
