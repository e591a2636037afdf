//! Token exchange client implementation.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use sha2::Sha256;

use super::types::{
    ExchangeError, GetUserResponse, InitiateAuthResponse, TokenPair, UserAttributes,
};
use super::TokenRefresher;
use crate::config::CognitoConfig;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_INITIATE_AUTH: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const TARGET_GET_USER: &str = "AWSCognitoIdentityProviderService.GetUser";

/// Client for the user pool's token endpoint and identity provider API.
pub struct TokenExchanger {
    http_client: Client,
    token_endpoint: String,
    idp_endpoint: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl TokenExchanger {
    /// Create an exchanger for the endpoints named in `config`.
    pub fn new(config: &CognitoConfig) -> Result<Self, ExchangeError> {
        Self::with_endpoints(
            &config.token_endpoint(),
            &config.idp_endpoint(),
            &config.client_id,
            config.client_secret.as_deref(),
            &config.redirect_uri,
            config.http_timeout(),
        )
    }

    /// Create an exchanger with explicit endpoints.
    pub fn with_endpoints(
        token_endpoint: &str,
        idp_endpoint: &str,
        client_id: &str,
        client_secret: Option<&str>,
        redirect_uri: &str,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            token_endpoint: token_endpoint.to_string(),
            idp_endpoint: idp_endpoint.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.map(String::from),
            redirect_uri: redirect_uri.to_string(),
        })
    }

    /// Exchange an authorization code from the hosted login page for tokens.
    pub fn exchange_authorization_code(&self, code: &str) -> Result<TokenPair, ExchangeError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        self.token_request(&params)
    }

    /// Exchange a refresh token for a new access token.
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, ExchangeError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        self.token_request(&params)
    }

    /// Direct username/password login (`USER_PASSWORD_AUTH`).
    pub fn authenticate_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, ExchangeError> {
        let mut auth_parameters = serde_json::Map::new();
        auth_parameters.insert("USERNAME".into(), username.into());
        auth_parameters.insert("PASSWORD".into(), password.into());

        if let Some(secret) = &self.client_secret {
            let hash = secret_hash(secret, username, &self.client_id)?;
            auth_parameters.insert("SECRET_HASH".into(), hash.into());
        }

        let body = serde_json::json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": auth_parameters,
        });

        let response: InitiateAuthResponse = self.idp_request(TARGET_INITIATE_AUTH, &body)?;

        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => Ok(result.into()),
            (None, Some(challenge)) => Err(ExchangeError::ChallengeRequired { challenge }),
            (None, None) => Err(ExchangeError::MalformedTokenResponse(
                "InitiateAuth returned neither tokens nor a challenge".into(),
            )),
        }
    }

    /// Look up the attributes of the user owning `access_token`.
    pub fn fetch_user_attributes(
        &self,
        access_token: &str,
    ) -> Result<UserAttributes, ExchangeError> {
        let body = serde_json::json!({ "AccessToken": access_token });
        let response: GetUserResponse = self.idp_request(TARGET_GET_USER, &body)?;
        Ok(response.into_attributes())
    }

    fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenPair, ExchangeError> {
        let mut request = self.http_client.post(&self.token_endpoint).form(params);

        if let Some(secret) = &self.client_secret {
            request = request.basic_auth(&self.client_id, Some(secret));
        }

        let response = request
            .send()
            .map_err(|e| ExchangeError::ExchangeUnreachable(e.to_string()))?;

        parse_success(response, &self.token_endpoint)
    }

    fn idp_request<T: DeserializeOwned>(
        &self,
        target: &str,
        body: &serde_json::Value,
    ) -> Result<T, ExchangeError> {
        let response = self
            .http_client
            .post(&self.idp_endpoint)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", target)
            .body(body.to_string())
            .send()
            .map_err(|e| ExchangeError::ExchangeUnreachable(e.to_string()))?;

        parse_success(response, target)
    }
}

impl TokenRefresher for TokenExchanger {
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, ExchangeError> {
        TokenExchanger::refresh_access_token(self, refresh_token)
    }
}

/// Turn a response into `T`, or into the matching exchange error.
fn parse_success<T: DeserializeOwned>(response: Response, call: &str) -> Result<T, ExchangeError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        tracing::warn!(
            call = %call,
            status = status.as_u16(),
            body = %body,
            "Identity provider rejected request"
        );
        return Err(ExchangeError::ExchangeRejected {
            status: status.as_u16(),
            body,
        });
    }

    let text = response
        .text()
        .map_err(|e| ExchangeError::ExchangeUnreachable(e.to_string()))?;

    serde_json::from_str(&text).map_err(|e| ExchangeError::MalformedTokenResponse(e.to_string()))
}

/// `Base64(HMAC_SHA256(secret, username + client_id))`
fn secret_hash(secret: &str, username: &str, client_id: &str) -> Result<String, ExchangeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::HttpClient(e.to_string()))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
