//! JWT token validation with JWKS signature verification.

use crate::oidc::jwks::SigningKeySet;
use crate::oidc::token::TokenClaims;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unknown signing key: {0}")]
    UnknownSigningKey(String),

    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Audience mismatch: expected {expected}")]
    AudienceMismatch { expected: String },
}

/// Verifies bearer tokens against an immutable [`SigningKeySet`].
#[derive(Debug, Clone)]
pub struct TokenValidator {
    keys: Arc<SigningKeySet>,
    /// Seconds of clock skew tolerated on `exp`
    leeway: i64,
}

impl TokenValidator {
    pub fn new(keys: Arc<SigningKeySet>) -> Self {
        Self { keys, leeway: 0 }
    }

    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway = leeway_secs.max(0);
        self
    }

    /// Validate a token and return the claims
    pub fn validate(&self, token: &str, audience: &str) -> Result<TokenClaims, ValidationError> {
        self.validate_at(token, audience, chrono::Utc::now().timestamp())
    }

    /// Validate against an explicit clock.
    ///
    /// Checks run in order: key id, signature, expiry, audience.
    pub fn validate_at(
        &self,
        token: &str,
        audience: &str,
        now: i64,
    ) -> Result<TokenClaims, ValidationError> {
        let header =
            decode_header(token).map_err(|e| ValidationError::MalformedToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| ValidationError::MalformedToken("header has no kid".into()))?;

        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| ValidationError::UnknownSigningKey(kid.clone()))?;

        // Signature only; time and audience are checked below so that their
        // precedence is fixed regardless of library defaults.
        let mut validation = Validation::new(key.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = decode::<TokenClaims>(token, &key.decoding_key, &validation)
            .map_err(classify)?
            .claims;

        if claims.exp.saturating_add(self.leeway) <= now {
            return Err(ValidationError::TokenExpired);
        }

        if !claims.has_audience(audience) {
            return Err(ValidationError::AudienceMismatch {
                expected: audience.to_string(),
            });
        }

        Ok(claims)
    }

    pub fn keys(&self) -> &SigningKeySet {
        &self.keys
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> ValidationError {
    match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => ValidationError::MalformedToken(err.to_string()),
        ErrorKind::ExpiredSignature => ValidationError::TokenExpired,
        _ => ValidationError::SignatureInvalid(err.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Token minting shared by the validator and session tests.

    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    pub const SECRET: &[u8] = b"k1-shared-secret-material";
    pub const CLIENT_ID: &str = "client-123";

    pub fn key_set() -> Arc<SigningKeySet> {
        let jwks = json!({
            "keys": [{
                "kid": "k1",
                "kty": "oct",
                "alg": "HS256",
                "k": URL_SAFE_NO_PAD.encode(SECRET),
            }]
        });
        Arc::new(SigningKeySet::from_json(&jwks.to_string()).unwrap())
    }

    pub fn validator() -> TokenValidator {
        TokenValidator::new(key_set())
    }

    pub fn sign_with(secret: &[u8], kid: Option<&str>, claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = kid.map(String::from);
        encode(&header, claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    pub fn sign(claims: &serde_json::Value) -> String {
        sign_with(SECRET, Some("k1"), claims)
    }

    pub fn claims(sub: &str, exp_offset: i64) -> serde_json::Value {
        json!({
            "sub": sub,
            "username": sub,
            "aud": CLIENT_ID,
            "exp": chrono::Utc::now().timestamp() + exp_offset,
            "iat": chrono::Utc::now().timestamp(),
        })
    }

    pub fn valid_token(sub: &str) -> String {
        sign(&claims(sub, 3600))
    }

    pub fn expired_token(sub: &str) -> String {
        sign(&claims(sub, -3600))
    }
}
