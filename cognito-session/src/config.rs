//! Configuration for the Cognito session layer.
//!
//! One [`CognitoConfig`] is built at startup and passed by reference to the key
//! cache, the exchanger and the validator. Nothing else reads the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default timeout for every call to the identity provider.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default lifetime of the refresh token cookie (30 days).
const DEFAULT_REFRESH_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "COGNITO_SESSION_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CognitoConfig {
    /// AWS region hosting the user pool, e.g. `us-east-1`
    pub region: String,

    /// User pool id, e.g. `us-east-1_AbCdEf`
    pub user_pool_id: String,

    /// App client id; also the expected token audience
    pub client_id: String,

    /// App client secret (confidential clients only)
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Hosted UI base, e.g. `https://myapp.auth.us-east-1.amazoncognito.com`
    pub auth_base_url: String,

    /// OAuth redirect URI registered for the app client
    pub redirect_uri: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    /// Where the hosted UI sends the browser after logout
    #[serde(default)]
    pub logout_redirect_uri: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_refresh_cookie_max_age")]
    pub refresh_cookie_max_age_secs: i64,

    /// Look up user attributes after validation
    #[serde(default = "default_true")]
    pub fetch_user_attributes: bool,

    /// Override for the JWKS URL (defaults to the user pool's well-known URL)
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// Override for the identity provider API endpoint
    #[serde(default)]
    pub idp_endpoint: Option<String>,
}

fn default_scope() -> String {
    "openid email".to_string()
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_refresh_cookie_max_age() -> i64 {
    DEFAULT_REFRESH_COOKIE_MAX_AGE_SECS
}

fn default_true() -> bool {
    true
}

impl CognitoConfig {
    /// Build a config with defaults for everything optional.
    pub fn new(
        region: &str,
        user_pool_id: &str,
        client_id: &str,
        auth_base_url: &str,
        redirect_uri: &str,
    ) -> Self {
        Self {
            region: region.to_string(),
            user_pool_id: user_pool_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: None,
            auth_base_url: normalize_auth_base(auth_base_url),
            redirect_uri: redirect_uri.to_string(),
            scope: default_scope(),
            logout_redirect_uri: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            refresh_cookie_max_age_secs: DEFAULT_REFRESH_COOKIE_MAX_AGE_SECS,
            fetch_user_attributes: true,
            jwks_url: None,
            idp_endpoint: None,
        }
    }

    pub fn with_client_secret(mut self, secret: &str) -> Self {
        self.client_secret = Some(secret.to_string());
        self
    }

    pub fn with_jwks_url(mut self, jwks_url: &str) -> Self {
        self.jwks_url = Some(jwks_url.to_string());
        self
    }

    pub fn with_idp_endpoint(mut self, endpoint: &str) -> Self {
        self.idp_endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Every missing required variable is reported in one error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let region = var("COGNITO_REGION").or_else(|| var("AWS_REGION"));
        let user_pool_id = var("COGNITO_USER_POOL_ID");
        let client_id = var("COGNITO_APP_CLIENT_ID");
        let auth_base_url = var("COGNITO_AUTH_URL_BASE");
        let redirect_uri = var("COGNITO_REDIRECT_URI");

        let missing: Vec<String> = [
            ("COGNITO_REGION", region.is_none()),
            ("COGNITO_USER_POOL_ID", user_pool_id.is_none()),
            ("COGNITO_APP_CLIENT_ID", client_id.is_none()),
            ("COGNITO_AUTH_URL_BASE", auth_base_url.is_none()),
            ("COGNITO_REDIRECT_URI", redirect_uri.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();

        let (
            Some(region),
            Some(user_pool_id),
            Some(client_id),
            Some(auth_base_url),
            Some(redirect_uri),
        ) = (region, user_pool_id, client_id, auth_base_url, redirect_uri)
        else {
            return Err(ConfigError::MissingEnvVars(missing));
        };

        let mut config = Self::new(
            &region,
            &user_pool_id,
            &client_id,
            &auth_base_url,
            &redirect_uri,
        );

        config.client_secret = var("COGNITO_APP_CLIENT_SECRET");
        config.logout_redirect_uri = var("COGNITO_LOGOUT_URI");
        config.jwks_url = var("COGNITO_JWKS_URL");
        config.idp_endpoint = var("COGNITO_IDP_ENDPOINT");

        if let Some(scope) = var("COGNITO_SCOPE") {
            config.scope = scope;
        }
        if let Some(timeout) = var("COGNITO_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = parse_var("COGNITO_HTTP_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(max_age) = var("COGNITO_REFRESH_COOKIE_MAX_AGE") {
            config.refresh_cookie_max_age_secs =
                parse_var("COGNITO_REFRESH_COOKIE_MAX_AGE", &max_age)?;
        }
        if let Some(flag) = var("COGNITO_FETCH_USER_ATTRIBUTES") {
            config.fetch_user_attributes = !matches!(flag.to_lowercase().as_str(), "false" | "0");
        }

        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;
        config.auth_base_url = normalize_auth_base(&config.auth_base_url);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("~/.config"));
        config_dir.join("cognito-session").join("config.yaml")
    }

    /// Load from default locations: explicit path, then the default file, then env.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Self::from_env()
        }
    }

    /// Token issuer for this user pool.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    pub fn jwks_url(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("{}/.well-known/jwks.json", self.issuer()))
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.auth_base_url)
    }

    pub fn idp_endpoint(&self) -> String {
        self.idp_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com", self.region))
    }

    /// Hosted UI login URL with the authorization-code parameters.
    pub fn login_url(&self) -> Result<String, ConfigError> {
        let url = Url::parse_with_params(
            &format!("{}/login", self.auth_base_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("scope", self.scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    /// Hosted UI logout URL, when a logout redirect is configured.
    pub fn logout_url(&self) -> Result<Option<String>, ConfigError> {
        let Some(logout_uri) = &self.logout_redirect_uri else {
            return Ok(None);
        };

        let url = Url::parse_with_params(
            &format!("{}/logout", self.auth_base_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("logout_uri", logout_uri.as_str()),
            ],
        )
        .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        Ok(Some(url.into()))
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

/// Accept either the hosted UI root or its `/login` page as the base.
fn normalize_auth_base(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    trimmed
        .strip_suffix("/login")
        .unwrap_or(trimmed)
        .to_string()
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), value.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
