use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use crate::confide::auth::{session, AuthState};

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session ended, redirected home"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, state, headers))]
pub async fn logout(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Response {
    session::end_session(&pool, &headers).await;

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = session::clear_session_cookie(state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (response_headers, Redirect::to("/")).into_response()
}
