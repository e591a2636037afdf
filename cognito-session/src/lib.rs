//! Session layer for a web application that logs users in through a Cognito
//! hosted login page.
//!
//! The workflow is:
//! 1. The user pool's signing keys are loaded once at startup ([`oidc::init_signing_keys`])
//! 2. An OAuth callback code or a username/password pair is exchanged for tokens
//!    ([`exchange::TokenExchanger`]); the caller stores them in cookies
//! 3. On each request the bearer token is validated against the keys
//!    ([`oidc::TokenValidator`]): signature, expiry, audience
//! 4. An expired access token is refreshed once with the refresh token
//!    ([`session::resolve_user`]) and the caller overwrites the cookie
//!
//! ## Environment Variables
//! - `COGNITO_REGION` / `AWS_REGION` (required): Region of the user pool
//! - `COGNITO_USER_POOL_ID` (required): User pool id
//! - `COGNITO_APP_CLIENT_ID` (required): App client id, also the expected audience
//! - `COGNITO_APP_CLIENT_SECRET` (optional): App client secret
//! - `COGNITO_AUTH_URL_BASE` (required): Hosted UI base URL
//! - `COGNITO_REDIRECT_URI` (required): OAuth redirect URI
//! - `COGNITO_SCOPE` (optional): OAuth scopes, defaults to "openid email"
//! - `COGNITO_LOGOUT_URI` (optional): Where hosted logout returns to
//! - `COGNITO_HTTP_TIMEOUT_SECS` (optional): Provider call timeout, defaults to 10

#![deny(unsafe_code)]

pub mod audit;
pub mod config;
pub mod exchange;
pub mod oidc;
pub mod session;

pub use config::{CognitoConfig, ConfigError};
pub use exchange::{ExchangeError, TokenExchanger, TokenPair, TokenRefresher, UserAttributes};
pub use oidc::{SigningKeySet, TokenClaims, TokenValidator, ValidationError};
pub use session::{bearer_token, resolve_user, AuthError, ResolvedUser};
