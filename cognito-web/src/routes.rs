//! HTTP routes.
//!
//! - `GET /` - Home page, or code exchange when `?code=` is present
//! - `GET /auth/login` - Login form
//! - `POST /auth/login` - Username/password login
//! - `GET /auth/callback` - OAuth callback from the hosted login page
//! - `GET /auth/logout` - Clear cookies
//! - `GET /api/me` - Current user as JSON
//!
//! Provider calls are blocking and run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use cognito_session::audit::AuditEvent;
use cognito_session::{bearer_token, resolve_user, TokenPair, UserAttributes};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cookies::{
    access_cookie, clear_tokens, is_secure_request, store_tokens, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::error::AppError;
use crate::html;
use crate::state::{CurrentUser, Session, SharedState};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/auth/login", get(login_form).post(login_submit))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", get(logout))
        .route("/api/me", get(me))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Task(e.to_string()))
}

/// Trade an authorization code for tokens. The response is trusted as-is.
async fn exchange_code(state: &SharedState, code: String) -> Result<TokenPair, AppError> {
    let state = Arc::clone(state);
    let result = blocking(move || state.exchanger.exchange_authorization_code(&code)).await?;

    match result {
        Ok(pair) => {
            info!("Authorization code exchanged");
            AuditEvent::login_success(None, "authorization_code").log();
            Ok(pair)
        }
        Err(e) => {
            warn!(error = %e, oauth_error = ?e.oauth_error(), "Authorization code exchange failed");
            AuditEvent::login_failed(None, "authorization_code", &e.to_string()).log();
            Err(AppError::LoginFailed(e))
        }
    }
}

/// Validate the request's token (refreshing once if expired) and look up the user.
async fn current_session(
    state: &SharedState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Result<Session, AppError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let access_token = bearer_token(authorization, jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value()))
        .map(String::from);
    let refresh_token = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());

    let state = Arc::clone(state);
    blocking(move || -> Result<Session, AppError> {
        let resolved = resolve_user(
            &state.validator,
            &state.exchanger,
            access_token.as_deref(),
            refresh_token.as_deref(),
            &state.config.client_id,
        )?;

        let attributes = if state.config.fetch_user_attributes {
            let token = resolved
                .new_access_token
                .as_deref()
                .or(access_token.as_deref())
                .ok_or(AppError::Unauthenticated)?;

            state.exchanger.fetch_user_attributes(token).map_err(|e| {
                warn!(error = %e, "User attribute lookup failed");
                AppError::Unauthenticated
            })?
        } else {
            UserAttributes::new()
        };

        Ok(Session {
            user: CurrentUser::new(&resolved.claims, attributes),
            refreshed_access_token: resolved.new_access_token,
        })
    })
    .await?
}

/// Overwrite the access token cookie when the session was refreshed.
fn with_refreshed_cookie(jar: CookieJar, session: &mut Session, secure: bool) -> CookieJar {
    match session.refreshed_access_token.take() {
        Some(token) => jar.add(access_cookie(token, secure)),
        None => jar,
    }
}

async fn home(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    Query(query): Query<HomeQuery>,
) -> Response {
    let secure = is_secure_request(&headers, &uri);

    if let Some(code) = query.code.filter(|c| !c.is_empty()) {
        return match exchange_code(&state, code).await {
            Ok(pair) => {
                let jar = store_tokens(jar, pair, secure, state.config.refresh_cookie_max_age_secs);
                (jar, Redirect::to("/")).into_response()
            }
            Err(e) => e.into_response(),
        };
    }

    match current_session(&state, &headers, &jar).await {
        Ok(mut session) => {
            let jar = with_refreshed_cookie(jar, &mut session, secure);
            (jar, Html(html::home_page(&session.user))).into_response()
        }
        Err(AppError::Unauthenticated) => {
            debug!("No valid session, redirecting to hosted login");
            Redirect::temporary(&state.login_url).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn login_form(State(state): State<SharedState>) -> Html<String> {
    Html(html::login_page(None, &state.login_url))
}

async fn login_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let secure = is_secure_request(&headers, &uri);
    let username = form.username.clone();

    let worker = Arc::clone(&state);
    let result = blocking(move || {
        worker
            .exchanger
            .authenticate_password(&form.username, &form.password)
    })
    .await?;

    match result {
        Ok(pair) => {
            info!(username = %username, "Password login succeeded");
            AuditEvent::login_success(Some(&username), "password").log();
            let jar = store_tokens(jar, pair, secure, state.config.refresh_cookie_max_age_secs);
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(e) => {
            warn!(username = %username, error = %e, "Password login failed");
            AuditEvent::login_failed(Some(&username), "password", &e.to_string()).log();
            Ok(Html(html::login_page(Some("Invalid credentials"), &state.login_url)).into_response())
        }
    }
}

async fn callback(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        warn!(error = %error, "Hosted login returned an error");
        AuditEvent::login_failed(None, "authorization_code", &error).log();
        return Err(AppError::ProviderDenied(error));
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Err(AppError::ProviderDenied("missing code".into()));
    };

    let secure = is_secure_request(&headers, &uri);
    let pair = exchange_code(&state, code).await?;
    let jar = store_tokens(jar, pair, secure, state.config.refresh_cookie_max_age_secs);

    Ok((jar, Redirect::to("/")).into_response())
}

async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> Response {
    let jar = clear_tokens(jar, is_secure_request(&headers, &uri));
    AuditEvent::logout().log();

    let target = state.logout_url.as_deref().unwrap_or("/");
    (jar, Redirect::to(target)).into_response()
}

async fn me(
    State(state): State<SharedState>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let mut session = current_session(&state, &headers, &jar).await?;
    let jar = with_refreshed_cookie(jar, &mut session, is_secure_request(&headers, &uri));

    Ok((jar, Json(session.user)).into_response())
}
