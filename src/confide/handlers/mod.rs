pub mod health;
pub use self::health::health;

pub mod home;
pub use self::home::home;

pub mod login;
pub use self::login::{login, login_form};

pub mod register;
pub use self::register::{register, register_form};

pub mod secrets;
pub use self::secrets::secrets;

pub mod submit;
pub use self::submit::{submit, submit_form};

pub mod logout;
pub use self::logout::logout;

pub mod google;
pub use self::google::{google_callback, google_redirect};

// common functions for the handlers
use axum::{
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use regex::Regex;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::confide::auth::{session, AuthState};

pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9._@-]{3,64}$").map_or(false, |re| re.is_match(username))
}

pub fn valid_password(password: &str) -> bool {
    (8..=128).contains(&password.len())
}

/// Escape user-provided text before it lands in a page.
pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Minimal shared page shell; real styling is not this service's business.
pub(crate) fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title} — Confide</title></head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    ))
}

/// Finish a successful login/registration: mint the session, set the cookie,
/// and send the browser on. Store failures surface as a 500 here.
pub(crate) async fn grant_session(
    pool: &PgPool,
    state: &Arc<AuthState>,
    headers: &HeaderMap,
    user_id: Uuid,
    to: &str,
) -> Response {
    match session::issue_session(pool, state, headers, user_id).await {
        Ok(cookie) => {
            let mut response_headers = HeaderMap::new();
            response_headers.insert(SET_COOKIE, cookie);
            (response_headers, Redirect::to(to)).into_response()
        }
        Err(err) => {
            error!("Failed to issue session: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error establishing session.".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_username_accepts_reasonable_names() {
        assert!(valid_username("alice"));
        assert!(valid_username("alice@example.com"));
        assert!(valid_username("a.b-c_d"));
    }

    #[test]
    fn valid_username_rejects_out_of_range() {
        assert!(!valid_username("ab"));
        assert!(!valid_username(&"a".repeat(65)));
        assert!(!valid_username("space here"));
        assert!(!valid_username("semi;colon"));
        assert!(!valid_username(""));
    }

    #[test]
    fn valid_password_bounds_length() {
        assert!(valid_password("12345678"));
        assert!(valid_password(&"p".repeat(128)));
        assert!(!valid_password("1234567"));
        assert!(!valid_password(&"p".repeat(129)));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn page_includes_title_and_body() {
        let Html(rendered) = page("Secrets", "<p>body</p>");
        assert!(rendered.contains("<title>Secrets — Confide</title>"));
        assert!(rendered.contains("<p>body</p>"));
    }
}
