//! Error responses for the web layer.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use cognito_session::{AuthError, ConfigError, ExchangeError};
use thiserror::Error;

use crate::html;

#[derive(Debug, Error)]
pub enum AppError {
    /// No usable session; API callers get JSON, pages redirect before reaching this.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The provider refused an authorization code.
    #[error("Login failed: {0}")]
    LoginFailed(#[source] ExchangeError),

    /// The provider redirected back with `?error=`.
    #[error("Login denied by provider: {0}")]
    ProviderDenied(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        AppError::Unauthenticated
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "unauthenticated" })),
            )
                .into_response(),
            AppError::LoginFailed(_) | AppError::ProviderDenied(_) => {
                (StatusCode::UNAUTHORIZED, Html(html::login_failed_page())).into_response()
            }
            AppError::Config(_) | AppError::Exchange(_) | AppError::Task(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn body_of(response: Response) -> String {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let bytes = runtime
            .block_on(to_bytes(response.into_body(), usize::MAX))
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_unauthenticated_is_json_401() {
        let response = AppError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response), r#"{"error":"unauthenticated"}"#);
    }

    #[test]
    fn test_login_failure_hides_provider_body() {
        let error = AppError::LoginFailed(ExchangeError::ExchangeRejected {
            status: 400,
            body: r#"{"error":"invalid_grant","error_description":"secret detail"}"#.into(),
        });

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_of(response);
        assert!(!body.contains("invalid_grant"));
        assert!(!body.contains("secret detail"));
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let response = AppError::Exchange(ExchangeError::ExchangeUnreachable(
            "connect to 10.0.0.1 refused".into(),
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response), "Internal server error");
    }
}
