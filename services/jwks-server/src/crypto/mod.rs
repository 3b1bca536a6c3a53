//! RSA key material: generation, storage encoding and public derivation.

pub mod encoding;
pub mod material;

pub use encoding::{b64u, int_to_base64url, to_minimal_be_bytes};
pub use material::{KeyMaterial, KEY_BITS, PUBLIC_EXPONENT};
