//! Session issue/resolve and the cookie plumbing around it.

use anyhow::{Context, Result};
use axum::{
    http::{
        header::{InvalidHeaderValue, COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::state::{AuthConfig, AuthState};
use super::storage::{delete_session, insert_session, lookup_session, SessionRecord};
use super::utils::{generate_state_token, hash_session_token, tokens_match};

pub const SESSION_COOKIE_NAME: &str = "confide_session";
pub const STATE_COOKIE_NAME: &str = "confide_oauth_state";

// The OAuth round-trip should finish well inside ten minutes.
const STATE_COOKIE_TTL_SECONDS: i64 = 600;

/// Resolve the session cookie into a session record, if any.
///
/// Returns `Ok(None)` — anonymous — when the cookie is missing, malformed,
/// expired, or points at a user that no longer exists.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<SessionRecord>, StatusCode> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_session_token(&token);
    match lookup_session(pool, &token_hash).await {
        Ok(record) => Ok(record),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Authentication guard for protected routes.
///
/// Anonymous requests get a redirect to the login page, never an error; a
/// store failure during resolution is the only 500 path.
pub(crate) async fn require_authenticated(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<SessionRecord, Response> {
    match authenticate_session(headers, pool).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(Redirect::to("/login").into_response()),
        Err(status) => Err(status.into_response()),
    }
}

/// Anonymous → Authenticated: mint a session for `user_id` and hand back the
/// `Set-Cookie` value. Any session the browser presented is replaced, so a
/// pre-login token never survives authentication.
pub(crate) async fn issue_session(
    pool: &PgPool,
    state: &AuthState,
    headers: &HeaderMap,
    user_id: Uuid,
) -> Result<HeaderValue> {
    if let Some(old_token) = extract_session_token(headers) {
        if let Err(err) = delete_session(pool, &hash_session_token(&old_token)).await {
            error!("Failed to delete superseded session: {err}");
        }
    }

    let ttl_seconds = state.config().session_ttl_seconds();
    let token = insert_session(pool, user_id, ttl_seconds).await?;

    session_cookie(state.config(), &token).context("failed to build session cookie")
}

/// Authenticated → Anonymous: drop the presented session row, if any.
/// The caller still clears the cookie either way.
pub(crate) async fn end_session(pool: &PgPool, headers: &HeaderMap) {
    if let Some(token) = extract_session_token(headers) {
        if let Err(err) = delete_session(pool, &hash_session_token(&token)).await {
            error!("Failed to delete session: {err}");
        }
    }
}

/// Mint the CSRF state token for the OAuth redirect.
pub(crate) fn new_state_token() -> Result<String> {
    generate_state_token()
}

/// Compare the state echoed by the provider against the cookie value.
pub(crate) fn state_matches(expected: &str, presented: &str) -> bool {
    tokens_match(expected, presented)
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    build_cookie(config, SESSION_COOKIE_NAME, token, ttl_seconds)
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, SESSION_COOKIE_NAME, "", 0)
}

pub(crate) fn state_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, STATE_COOKIE_NAME, token, STATE_COOKIE_TTL_SECONDS)
}

pub(crate) fn clear_state_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, STATE_COOKIE_NAME, "", 0)
}

fn build_cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    // Only mark cookies secure when the site is served over HTTPS.
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, SESSION_COOKIE_NAME)
}

pub(crate) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extract_session_token_finds_cookie() {
        let headers = headers_with_cookie("other=1; confide_session=tok-123; theme=dark");
        assert_eq!(extract_session_token(&headers), Some("tok-123".to_string()));
    }

    #[test]
    fn extract_session_token_ignores_other_cookies() {
        let headers = headers_with_cookie("confide_sessionx=nope; session=also-nope");
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn extract_session_token_skips_empty_value() {
        let headers = headers_with_cookie("confide_session=");
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn extract_session_token_none_without_header() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn session_cookie_carries_ttl_and_flags() {
        let config = AuthConfig::new().with_session_ttl_seconds(86_400);
        let cookie = session_cookie(&config, "tok").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("confide_session=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=86400"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn secure_flag_follows_config() {
        let config = AuthConfig::new().with_cookie_secure(true);
        let cookie = session_cookie(&config, "tok").unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let config = AuthConfig::new();
        let cookie = clear_session_cookie(&config).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("confide_session=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn state_cookie_is_short_lived() {
        let config = AuthConfig::new();
        let cookie = state_cookie(&config, "st").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("confide_oauth_state=st;"));
        assert!(value.contains("Max-Age=600"));
    }

    #[test]
    fn state_matches_rejects_mismatch() {
        assert!(state_matches("abc", "abc"));
        assert!(!state_matches("abc", "xyz"));
    }
}
