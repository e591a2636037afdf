//! Signing key cache.
//!
//! The user pool's JWKS is fetched once, converted into decoding keys indexed by
//! key id, and never refreshed. The process-wide set is installed through
//! [`init_signing_keys`] before the service accepts traffic.

use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::CognitoConfig;

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("Failed to fetch JWKS: {0}")]
    JwksFetchError(String),

    #[error("Failed to parse JWKS: {0}")]
    JwksParseError(String),

    #[error("No usable signing keys in JWKS")]
    NoKeys,
}

/// A verified-ready public key and the algorithm it signs with.
#[derive(Clone)]
pub struct SigningKey {
    pub algorithm: Algorithm,
    pub decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Immutable key id -> signing key map.
#[derive(Debug, Clone, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, SigningKey>,
}

static SIGNING_KEYS: OnceCell<Arc<SigningKeySet>> = OnceCell::new();

/// Load the process-wide key set, fetching it on the first call only.
///
/// Concurrent first callers wait for a single fetch. A failed fetch leaves the
/// cell empty and is returned to the caller, which should treat it as fatal.
pub fn init_signing_keys(config: &CognitoConfig) -> Result<Arc<SigningKeySet>, JwksError> {
    SIGNING_KEYS
        .get_or_try_init(|| {
            SigningKeySet::load(&config.jwks_url(), config.http_timeout()).map(Arc::new)
        })
        .cloned()
}

/// The process-wide key set, if [`init_signing_keys`] has completed.
pub fn global_signing_keys() -> Option<Arc<SigningKeySet>> {
    SIGNING_KEYS.get().cloned()
}

impl SigningKeySet {
    /// Fetch and parse the JWKS at `jwks_url`.
    pub fn load(jwks_url: &str, timeout: Duration) -> Result<Self, JwksError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JwksError::JwksFetchError(e.to_string()))?;

        let response = client
            .get(jwks_url)
            .send()
            .map_err(|e| JwksError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JwksError::JwksFetchError(format!(
                "HTTP {}: {}",
                response.status(),
                jwks_url
            )));
        }

        let jwks = response
            .json::<JwkSet>()
            .map_err(|e| JwksError::JwksParseError(e.to_string()))?;

        let set = Self::from_jwk_set(&jwks)?;
        tracing::info!(url = %jwks_url, keys = set.len(), "Loaded signing keys");
        Ok(set)
    }

    /// Parse a JWKS document held in memory.
    pub fn from_json(json: &str) -> Result<Self, JwksError> {
        let jwks: JwkSet =
            serde_json::from_str(json).map_err(|e| JwksError::JwksParseError(e.to_string()))?;
        Self::from_jwk_set(&jwks)
    }

    /// Index usable keys by kid. Keys without a kid or a signing algorithm are skipped.
    pub fn from_jwk_set(jwks: &JwkSet) -> Result<Self, JwksError> {
        let mut keys = HashMap::new();

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("Skipping JWKS key without kid");
                continue;
            };

            match signing_key(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(reason) => {
                    tracing::warn!(kid = %kid, reason = %reason, "Skipping unusable JWKS key");
                }
            }
        }

        if keys.is_empty() {
            return Err(JwksError::NoKeys);
        }

        Ok(Self { keys })
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn signing_key(jwk: &Jwk) -> Result<SigningKey, String> {
    let algorithm = jwk
        .common
        .key_algorithm
        .as_ref()
        .ok_or_else(|| "missing alg".to_string())
        .and_then(signing_algorithm)?;

    let decoding_key = DecodingKey::from_jwk(jwk).map_err(|e| e.to_string())?;

    Ok(SigningKey {
        algorithm,
        decoding_key,
    })
}

fn signing_algorithm(alg: &KeyAlgorithm) -> Result<Algorithm, String> {
    match alg {
        KeyAlgorithm::HS256 => Ok(Algorithm::HS256),
        KeyAlgorithm::HS384 => Ok(Algorithm::HS384),
        KeyAlgorithm::HS512 => Ok(Algorithm::HS512),
        KeyAlgorithm::RS256 => Ok(Algorithm::RS256),
        KeyAlgorithm::RS384 => Ok(Algorithm::RS384),
        KeyAlgorithm::RS512 => Ok(Algorithm::RS512),
        KeyAlgorithm::PS256 => Ok(Algorithm::PS256),
        KeyAlgorithm::PS384 => Ok(Algorithm::PS384),
        KeyAlgorithm::PS512 => Ok(Algorithm::PS512),
        KeyAlgorithm::ES256 => Ok(Algorithm::ES256),
        KeyAlgorithm::ES384 => Ok(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Ok(Algorithm::EdDSA),
        other => Err(format!("{:?} is not a signing algorithm", other)),
    }
}
