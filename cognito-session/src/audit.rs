//! Audit logging for login and session events.
//!
//! Events are serialized to JSON and emitted on the `audit` tracing target, so
//! they can be routed to a separate sink with an `EnvFilter` directive such as
//! `audit=info`.

use serde::Serialize;

/// Tracing target for audit records.
pub const AUDIT_TARGET: &str = "audit";

/// Audit events for the login/session layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum AuditEvent {
    /// Tokens obtained and cookies issued
    #[serde(rename = "LOGIN_SUCCESS")]
    LoginSuccess {
        timestamp: String,
        user: Option<String>,
        method: String,
    },

    /// Password login or code exchange failed
    #[serde(rename = "LOGIN_FAILED")]
    LoginFailed {
        timestamp: String,
        user: Option<String>,
        method: String,
        reason: String,
    },

    /// Presented token was rejected
    #[serde(rename = "TOKEN_VALIDATION_FAILED")]
    TokenValidationFailed {
        timestamp: String,
        user: Option<String>,
        reason: String,
    },

    /// Expired access token replaced via the refresh token
    #[serde(rename = "TOKEN_REFRESHED")]
    TokenRefreshed { timestamp: String, user: String },

    #[serde(rename = "TOKEN_REFRESH_FAILED")]
    TokenRefreshFailed { timestamp: String, reason: String },

    #[serde(rename = "LOGOUT")]
    Logout { timestamp: String },
}

impl AuditEvent {
    pub fn login_success(user: Option<&str>, method: &str) -> Self {
        Self::LoginSuccess {
            timestamp: iso_timestamp(),
            user: user.map(String::from),
            method: method.to_string(),
        }
    }

    pub fn login_failed(user: Option<&str>, method: &str, reason: &str) -> Self {
        Self::LoginFailed {
            timestamp: iso_timestamp(),
            user: user.map(String::from),
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn token_validation_failed(user: Option<&str>, reason: &str) -> Self {
        Self::TokenValidationFailed {
            timestamp: iso_timestamp(),
            user: user.map(String::from),
            reason: reason.to_string(),
        }
    }

    pub fn token_refreshed(user: &str) -> Self {
        Self::TokenRefreshed {
            timestamp: iso_timestamp(),
            user: user.to_string(),
        }
    }

    pub fn token_refresh_failed(reason: &str) -> Self {
        Self::TokenRefreshFailed {
            timestamp: iso_timestamp(),
            reason: reason.to_string(),
        }
    }

    pub fn logout() -> Self {
        Self::Logout {
            timestamp: iso_timestamp(),
        }
    }

    /// Emit this event on the audit target.
    pub fn log(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            tracing::info!(target: AUDIT_TARGET, event = self.event_type(), "{}", json);
        }
    }

    /// Get the event type as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::LoginSuccess { .. } => "LOGIN_SUCCESS",
            Self::LoginFailed { .. } => "LOGIN_FAILED",
            Self::TokenValidationFailed { .. } => "TOKEN_VALIDATION_FAILED",
            Self::TokenRefreshed { .. } => "TOKEN_REFRESHED",
            Self::TokenRefreshFailed { .. } => "TOKEN_REFRESH_FAILED",
            Self::Logout { .. } => "LOGOUT",
        }
    }
}

/// Get the current timestamp in ISO 8601 format.
fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
