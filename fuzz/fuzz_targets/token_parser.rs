//! Fuzz target for bearer token validation
//!
//! Feeds arbitrary strings through the validator. Signatures will almost never
//! verify; the point is that header parsing, key lookup and claim decoding
//! reject bad input with an error instead of panicking.

#![no_main]

use std::sync::Arc;

use cognito_session::{SigningKeySet, TokenValidator};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

const JWKS: &str = r#"{"keys":[{"kid":"k1","kty":"oct","alg":"HS256","k":"ZnV6ei1zaWduaW5nLWtleQ"}]}"#;

static VALIDATOR: Lazy<Option<TokenValidator>> = Lazy::new(|| {
    SigningKeySet::from_json(JWKS)
        .ok()
        .map(|keys| TokenValidator::new(Arc::new(keys)))
});

fuzz_target!(|data: &[u8]| {
    let Some(validator) = VALIDATOR.as_ref() else {
        return;
    };

    if let Ok(token) = std::str::from_utf8(data) {
        let _ = validator.validate(token, "fuzz-client");

        // Also exercise the bearer header path
        let header = format!("Bearer {token}");
        if let Some(bearer) = cognito_session::bearer_token(Some(&header), None) {
            let _ = validator.validate_at(bearer, "fuzz-client", 0);
        }
    }
});
