//! Token cookies.
//!
//! Both cookies are httponly and SameSite=Lax; `secure` follows the request scheme.
//! The access token cookie is session-scoped and overwritten on refresh. The
//! refresh token cookie carries a fixed max-age.

use axum::http::{HeaderMap, Uri};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cognito_session::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Whether the browser reached us over https, directly or via a proxy.
pub fn is_secure_request(headers: &HeaderMap, uri: &Uri) -> bool {
    let forwarded = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"));

    forwarded.unwrap_or_else(|| uri.scheme_str() == Some("https"))
}

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub fn access_cookie(token: String, secure: bool) -> Cookie<'static> {
    base_cookie(ACCESS_TOKEN_COOKIE, token, secure)
}

pub fn refresh_cookie(token: String, secure: bool, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = base_cookie(REFRESH_TOKEN_COOKIE, token, secure);
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie
}

/// Add cookies for a fresh token pair. No refresh cookie unless the pair has one.
pub fn store_tokens(
    jar: CookieJar,
    pair: TokenPair,
    secure: bool,
    refresh_max_age_secs: i64,
) -> CookieJar {
    let jar = jar.add(access_cookie(pair.access_token, secure));

    match pair.refresh_token {
        Some(refresh) => jar.add(refresh_cookie(refresh, secure, refresh_max_age_secs)),
        None => jar,
    }
}

/// Expire both token cookies.
pub fn clear_tokens(jar: CookieJar, secure: bool) -> CookieJar {
    let expire = |name| {
        let mut cookie = base_cookie(name, String::new(), secure);
        cookie.set_max_age(time::Duration::seconds(0));
        cookie
    };

    jar.add(expire(ACCESS_TOKEN_COOKIE))
        .add(expire(REFRESH_TOKEN_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_access_only_pair_sets_one_cookie() {
        let jar = store_tokens(CookieJar::new(), TokenPair::access_only("jwt1"), false, 60);

        assert_eq!(jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value()), Some("jwt1"));
        assert!(jar.get(REFRESH_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn test_full_pair_sets_both_cookies() {
        let mut pair = TokenPair::access_only("jwt1");
        pair.refresh_token = Some("r1".into());

        let jar = store_tokens(CookieJar::new(), pair, true, 2_592_000);

        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert!(access.max_age().is_none());

        let refresh = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(refresh.value(), "r1");
        assert_eq!(refresh.max_age(), Some(time::Duration::seconds(2_592_000)));
    }

    #[test]
    fn test_clear_tokens_expires_both() {
        let jar = clear_tokens(CookieJar::new(), false);

        for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
            let cookie = jar.get(name).unwrap();
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        }
    }

    #[test]
    fn test_secure_from_forwarded_proto() {
        let uri: Uri = "/".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert!(!is_secure_request(&headers, &uri));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert!(is_secure_request(&headers, &uri));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        let https: Uri = "https://app.example.com/".parse().unwrap();
        assert!(!is_secure_request(&headers, &https));
    }

    #[test]
    fn test_secure_from_request_scheme() {
        let https: Uri = "https://app.example.com/".parse().unwrap();
        assert!(is_secure_request(&HeaderMap::new(), &https));
    }
}
