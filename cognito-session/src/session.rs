//! Resolving the current user from request cookies, refreshing once on expiry.
//!
//! Per request the coordinator walks a small state machine:
//!
//! ```text
//! NoToken ──────────────────────────────────────────► Unauthenticated
//! Validating ──► Valid
//!            ──► Invalid ───────────────────────────► Unauthenticated
//!            ──► Expired ──(no refresh token)───────► Unauthenticated
//!                        ──► Refreshing ──► Valid (with new access token)
//!                                       ──► Unauthenticated
//! ```
//!
//! The refreshed token is validated exactly once. A second expiry is terminal.

use crate::audit::AuditEvent;
use crate::exchange::TokenRefresher;
use crate::oidc::{TokenClaims, TokenValidator, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The only outcome shown to the browser; details are logged.
    #[error("Unauthenticated")]
    Unauthenticated,
}

/// A validated user, plus the access token to persist if one was refreshed.
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub claims: TokenClaims,
    pub new_access_token: Option<String>,
}

/// Pick the bearer token for a request: `Authorization: Bearer` first, then the cookie.
pub fn bearer_token<'a>(
    authorization: Option<&'a str>,
    access_cookie: Option<&'a str>,
) -> Option<&'a str> {
    authorization
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty())
        .or_else(|| access_cookie.filter(|token| !token.is_empty()))
}

/// Validate the presented access token, refreshing it once if it has expired.
pub fn resolve_user<R: TokenRefresher + ?Sized>(
    validator: &TokenValidator,
    refresher: &R,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
    audience: &str,
) -> Result<ResolvedUser, AuthError> {
    let access_token = access_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthenticated)?;

    match validator.validate(access_token, audience) {
        Ok(claims) => Ok(ResolvedUser {
            claims,
            new_access_token: None,
        }),
        Err(ValidationError::TokenExpired) => {
            let refresh_token = refresh_token.filter(|t| !t.is_empty()).ok_or_else(|| {
                tracing::debug!("Access token expired and no refresh token present");
                AuthError::Unauthenticated
            })?;
            refresh_once(validator, refresher, refresh_token, audience)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Access token rejected");
            AuditEvent::token_validation_failed(None, &e.to_string()).log();
            Err(AuthError::Unauthenticated)
        }
    }
}

fn refresh_once<R: TokenRefresher + ?Sized>(
    validator: &TokenValidator,
    refresher: &R,
    refresh_token: &str,
    audience: &str,
) -> Result<ResolvedUser, AuthError> {
    let pair = refresher.refresh_access_token(refresh_token).map_err(|e| {
        tracing::warn!(error = %e, "Token refresh failed");
        AuditEvent::token_refresh_failed(&e.to_string()).log();
        AuthError::Unauthenticated
    })?;

    let claims = validator
        .validate(&pair.access_token, audience)
        .map_err(|e| {
            tracing::warn!(error = %e, "Refreshed access token rejected");
            AuditEvent::token_validation_failed(None, &e.to_string()).log();
            AuthError::Unauthenticated
        })?;

    AuditEvent::token_refreshed(claims.username()).log();

    Ok(ResolvedUser {
        claims,
        new_access_token: Some(pair.access_token),
    })
}
