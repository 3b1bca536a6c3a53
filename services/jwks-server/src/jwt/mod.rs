//! Claims, signing and token issuance.

pub mod builder;
pub mod claims;
pub mod issuer;
pub mod serializer;

pub use builder::JwtBuilder;
pub use claims::Claims;
pub use issuer::{IssuedToken, TokenIssuer};
pub use serializer::JwtSerializer;
