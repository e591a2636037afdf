//! Signing keys, token claims and validation.

pub mod jwks;
pub mod token;
pub mod validation;

pub use jwks::{global_signing_keys, init_signing_keys, JwksError, SigningKey, SigningKeySet};
pub use token::{StringOrVec, TokenClaims};
pub use validation::{TokenValidator, ValidationError};
