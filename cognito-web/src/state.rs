//! Shared application state and the per-request user.

use std::collections::BTreeMap;
use std::sync::Arc;

use cognito_session::{
    CognitoConfig, SigningKeySet, TokenClaims, TokenExchanger, TokenValidator, UserAttributes,
};
use serde::Serialize;

use crate::error::AppError;

/// Everything a handler needs. Built once at startup, read-only afterwards.
pub struct AppState {
    pub config: CognitoConfig,
    pub validator: TokenValidator,
    pub exchanger: TokenExchanger,
    pub login_url: String,
    pub logout_url: Option<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Must run outside the async runtime: the exchanger owns a blocking HTTP client.
    pub fn new(config: CognitoConfig, keys: Arc<SigningKeySet>) -> Result<Self, AppError> {
        let login_url = config.login_url()?;
        let logout_url = config.logout_url()?;
        let exchanger = TokenExchanger::new(&config)?;

        Ok(Self {
            validator: TokenValidator::new(keys),
            exchanger,
            login_url,
            logout_url,
            config,
        })
    }
}

/// The authenticated user as shown to pages and `/api/me`.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub sub: String,
    pub username: String,
    pub email: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl CurrentUser {
    pub fn new(claims: &TokenClaims, attributes: UserAttributes) -> Self {
        let attributes: BTreeMap<String, String> = attributes.into_iter().collect();
        let email = claims
            .email
            .clone()
            .or_else(|| attributes.get("email").cloned());

        Self {
            sub: claims.sub.clone(),
            username: claims.username().to_string(),
            email,
            attributes,
        }
    }
}

/// A resolved user plus the access token to write back if it was refreshed.
#[derive(Debug)]
pub struct Session {
    pub user: CurrentUser,
    pub refreshed_access_token: Option<String>,
}
