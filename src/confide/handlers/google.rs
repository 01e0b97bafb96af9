use axum::{
    extract::{Extension, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument, warn};

use super::grant_session;
use crate::confide::auth::{federated, session, AuthState};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/auth/google",
    responses(
        (status = 303, description = "Redirect to the Google consent screen"),
    ),
    tag = "auth"
)]
#[instrument(skip(state))]
pub async fn google_redirect(state: Extension<Arc<AuthState>>) -> Response {
    let Ok(csrf_state) = session::new_state_token() else {
        return oauth_unavailable();
    };

    let authorize_url = match state.google().authorize_url(&csrf_state) {
        Ok(url) => url,
        Err(err) => {
            error!("Failed to build authorization URL: {err:?}");
            return oauth_unavailable();
        }
    };

    let Ok(cookie) = session::state_cookie(state.config(), &csrf_state) else {
        return oauth_unavailable();
    };

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    (response_headers, Redirect::to(&authorize_url)).into_response()
}

#[utoipa::path(
    get,
    path = "/auth/google/secrets",
    responses(
        (status = 303, description = "Redirect to the secrets listing on success, the login page otherwise"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, state, headers, query))]
pub async fn google_callback(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
    query: Query<CallbackQuery>,
) -> Response {
    let query = query.0;

    // The state cookie is single-use: cleared on every outcome.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = session::clear_state_cookie(state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }

    if let Some(provider_error) = query.error {
        warn!("Google returned an error: {provider_error}");
        return back_to_login(response_headers);
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return back_to_login(response_headers);
    };

    let Some(expected_state) = session::extract_cookie(&headers, session::STATE_COOKIE_NAME)
    else {
        return back_to_login(response_headers);
    };

    if !session::state_matches(&expected_state, &returned_state) {
        warn!("OAuth state mismatch");
        return back_to_login(response_headers);
    }

    let access_token = match state.google().exchange_code(&code).await {
        Ok(token) => token,
        Err(err) => {
            warn!("Code exchange failed: {err:?}");
            return back_to_login(response_headers);
        }
    };

    let subject = match state.google().fetch_subject(&access_token).await {
        Ok(subject) => subject,
        Err(err) => {
            warn!("Profile fetch failed: {err:?}");
            return back_to_login(response_headers);
        }
    };

    let user = match federated::resolve(&pool, &subject).await {
        Ok(outcome) => outcome.into_user(),
        Err(err) => {
            error!("Federated resolve failed: {err:?}");
            return back_to_login(response_headers);
        }
    };

    let mut granted = grant_session(&pool, &state, &headers, user.id, "/secrets").await;
    if granted.status() == StatusCode::SEE_OTHER {
        if let Ok(cookie) = session::clear_state_cookie(state.config()) {
            granted.headers_mut().append(SET_COOKIE, cookie);
        }
        granted
    } else {
        // A session failure after a valid provider round-trip still lands on
        // the login page rather than an error body.
        back_to_login(response_headers)
    }
}

fn back_to_login(response_headers: HeaderMap) -> Response {
    (response_headers, Redirect::to("/login")).into_response()
}

fn oauth_unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error starting Google sign-in.".to_string(),
    )
        .into_response()
}
