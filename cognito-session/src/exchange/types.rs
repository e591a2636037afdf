//! Types for the token endpoint and the identity provider API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error types for token exchanges.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The provider answered with a non-2xx status.
    #[error("Exchange rejected with HTTP {status}")]
    ExchangeRejected { status: u16, body: String },

    /// Timeout, DNS failure, connection reset.
    #[error("Identity provider unreachable: {0}")]
    ExchangeUnreachable(String),

    /// 2xx response that is not a usable token response.
    #[error("Malformed token response: {0}")]
    MalformedTokenResponse(String),

    /// Password login needs an extra step (MFA, new password).
    #[error("Authentication challenge required: {challenge}")]
    ChallengeRequired { challenge: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl ExchangeError {
    /// OAuth error code from a rejected response body, if it carries one.
    pub fn oauth_error(&self) -> Option<String> {
        match self {
            ExchangeError::ExchangeRejected { body, .. } => {
                serde_json::from_str::<TokenErrorResponse>(body)
                    .ok()
                    .map(|e| e.error)
            }
            _ => None,
        }
    }
}

/// Tokens produced by one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenPair {
    /// The access token.
    pub access_token: String,

    /// Returned on code exchange and password login, not on refresh.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub id_token: Option<String>,

    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// The token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenPair {
    /// A pair holding only an access token.
    pub fn access_only(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: None,
            id_token: None,
            expires_in: None,
            token_type: None,
        }
    }
}

/// Error body from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,

    #[serde(default)]
    pub error_description: Option<String>,
}

/// `InitiateAuth` response from the identity provider API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InitiateAuthResponse {
    #[serde(default)]
    pub authentication_result: Option<AuthenticationResult>,

    #[serde(default)]
    pub challenge_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticationResult {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub id_token: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<AuthenticationResult> for TokenPair {
    fn from(result: AuthenticationResult) -> Self {
        Self {
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            id_token: result.id_token,
            expires_in: result.expires_in,
            token_type: result.token_type,
        }
    }
}

/// `GetUser` response from the identity provider API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetUserResponse {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub user_attributes: Vec<UserAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UserAttribute {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

/// User attributes keyed by attribute name (`email`, `custom:tier`, ...).
pub type UserAttributes = HashMap<String, String>;

impl GetUserResponse {
    pub(crate) fn into_attributes(self) -> UserAttributes {
        let mut attributes: UserAttributes = self
            .user_attributes
            .into_iter()
            .map(|attr| (attr.name, attr.value))
            .collect();

        if let Some(username) = self.username {
            attributes.entry("username".to_string()).or_insert(username);
        }

        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_deserialize() {
        let json = r#"{
            "access_token": "jwt1",
            "refresh_token": "r1",
            "id_token": "id1",
            "token_type": "Bearer",
            "expires_in": 3600
        }"#;

        let pair: TokenPair = serde_json::from_str(json).unwrap();

        assert_eq!(pair.access_token, "jwt1");
        assert_eq!(pair.refresh_token.as_deref(), Some("r1"));
        assert_eq!(pair.expires_in, Some(3600));
    }

    #[test]
    fn test_token_pair_optional_fields() {
        let pair: TokenPair = serde_json::from_str(r#"{"access_token":"jwt1"}"#).unwrap();
        assert_eq!(pair, TokenPair::access_only("jwt1"));
    }

    #[test]
    fn test_token_pair_requires_access_token() {
        let result: Result<TokenPair, _> = serde_json::from_str(r#"{"id_token":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_oauth_error_extraction() {
        let err = ExchangeError::ExchangeRejected {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        assert_eq!(err.oauth_error().as_deref(), Some("invalid_grant"));

        let err = ExchangeError::ExchangeRejected {
            status: 502,
            body: "<html>bad gateway</html>".to_string(),
        };
        assert!(err.oauth_error().is_none());
    }

    #[test]
    fn test_rejected_display_omits_body() {
        let err = ExchangeError::ExchangeRejected {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        assert_eq!(err.to_string(), "Exchange rejected with HTTP 400");
    }

    #[test]
    fn test_initiate_auth_response() {
        let json = r#"{
            "AuthenticationResult": {
                "AccessToken": "a",
                "IdToken": "i",
                "RefreshToken": "r",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            },
            "ChallengeParameters": {}
        }"#;

        let response: InitiateAuthResponse = serde_json::from_str(json).unwrap();
        let pair: TokenPair = response.authentication_result.unwrap().into();

        assert_eq!(pair.access_token, "a");
        assert_eq!(pair.refresh_token.as_deref(), Some("r"));
        assert_eq!(pair.id_token.as_deref(), Some("i"));
    }

    #[test]
    fn test_get_user_attributes() {
        let json = r#"{
            "Username": "alice",
            "UserAttributes": [
                {"Name": "email", "Value": "alice@example.com"},
                {"Name": "custom:tier", "Value": "gold"}
            ]
        }"#;

        let response: GetUserResponse = serde_json::from_str(json).unwrap();
        let attributes = response.into_attributes();

        assert_eq!(attributes["email"], "alice@example.com");
        assert_eq!(attributes["custom:tier"], "gold");
        assert_eq!(attributes["username"], "alice");
    }
}
