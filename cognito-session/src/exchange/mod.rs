//! OAuth 2.0 token exchanges against the user pool.
//!
//! Covers the authorization-code grant used by the hosted login callback, the
//! refresh-token grant used when an access token expires, and the direct
//! password login and user lookup calls of the identity provider API.

pub mod client;
pub mod types;

pub use client::TokenExchanger;
pub use types::{ExchangeError, TokenErrorResponse, TokenPair, UserAttributes};

/// Exchanges a refresh token for a new access token.
///
/// The session coordinator depends on this seam rather than on
/// [`TokenExchanger`] so the refresh path can be driven without a network.
pub trait TokenRefresher {
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, ExchangeError>;
}
