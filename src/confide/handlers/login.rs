use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::{grant_session, page, valid_password, valid_username};
use crate::confide::auth::{
    credentials::{self, LoginOutcome},
    AuthState,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", body = String, content_type = "text/html"),
    ),
    tag = "pages"
)]
pub async fn login_form() -> impl IntoResponse {
    page(
        "Log in",
        r#"<form method="post" action="/login">
  <label>Username <input type="text" name="username" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>
<p><a href="/auth/google">Sign in with Google</a> or <a href="/register">register</a>.</p>"#,
    )
}

#[utoipa::path(
    post,
    path = "/login",
    responses(
        (status = 303, description = "Logged in, redirected to the secrets listing"),
        (status = 401, description = "Invalid username or password", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, state, headers, payload))]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
    payload: Option<Form<LoginForm>>,
) -> Response {
    let Some(Form(form)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    // Malformed input gets the same generic answer as a wrong password.
    if !valid_username(&form.username) || !valid_password(&form.password) {
        return invalid_credentials();
    }

    match credentials::login(&pool, &form.username, &form.password).await {
        Ok(LoginOutcome::Verified(user)) => {
            grant_session(&pool, &state, &headers, user.id, "/secrets").await
        }
        Ok(LoginOutcome::InvalidCredentials) => invalid_credentials(),
        Err(err) => {
            error!("Login failed: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error logging in.".to_string(),
            )
                .into_response()
        }
    }
}

fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        "Invalid username or password.".to_string(),
    )
        .into_response()
}
