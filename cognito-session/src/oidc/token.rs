//! Token claims.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user pool user id)
    pub sub: String,

    /// Expiration time
    pub exp: i64,

    /// Issued at
    #[serde(default)]
    pub iat: Option<i64>,

    /// Issuer
    #[serde(default)]
    pub iss: Option<String>,

    /// Audience (ID tokens)
    #[serde(default)]
    pub aud: Option<StringOrVec>,

    /// Client the token was issued to (access tokens carry this instead of `aud`)
    #[serde(default)]
    pub client_id: Option<String>,

    /// Username (access tokens)
    #[serde(default)]
    pub username: Option<String>,

    /// Username (ID tokens)
    #[serde(default, rename = "cognito:username")]
    pub cognito_username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// `access` or `id`
    #[serde(default)]
    pub token_use: Option<String>,

    /// Remaining claims (groups, custom attributes, scopes)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Handle audience as string or array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrVec {
    String(String),
    Vec(Vec<String>),
}

impl StringOrVec {
    /// Check if the audience contains a specific value
    pub fn contains(&self, value: &str) -> bool {
        match self {
            StringOrVec::String(s) => s == value,
            StringOrVec::Vec(v) => v.iter().any(|s| s == value),
        }
    }
}

impl TokenClaims {
    /// The name to show for this user: `username`, `cognito:username`, then `sub`.
    pub fn username(&self) -> &str {
        self.username
            .as_deref()
            .or(self.cognito_username.as_deref())
            .unwrap_or(&self.sub)
    }

    /// Whether the token was issued for `audience`.
    ///
    /// `aud` wins when present; otherwise the `client_id` claim is compared.
    pub fn has_audience(&self, audience: &str) -> bool {
        match (&self.aud, &self.client_id) {
            (Some(aud), _) => aud.contains(audience),
            (None, Some(client_id)) => client_id == audience,
            (None, None) => false,
        }
    }
}
