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
    credentials::{self, RegisterOutcome},
    AuthState,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterForm {
    username: String,
    password: String,
}

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Registration form", body = String, content_type = "text/html"),
    ),
    tag = "pages"
)]
pub async fn register_form() -> impl IntoResponse {
    page(
        "Register",
        r#"<form method="post" action="/register">
  <label>Username <input type="text" name="username" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Register</button>
</form>
<p>Already have an account? <a href="/login">Log in</a>.</p>"#,
    )
}

#[utoipa::path(
    post,
    path = "/register",
    responses(
        (status = 303, description = "Registered and logged in, redirected to the secrets listing"),
        (status = 400, description = "Invalid username or password", body = String),
        (status = 409, description = "Username already taken", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, state, headers, payload))]
pub async fn register(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
    payload: Option<Form<RegisterForm>>,
) -> Response {
    let Some(Form(form)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if !valid_username(&form.username) {
        return (StatusCode::BAD_REQUEST, "Invalid username.".to_string()).into_response();
    }

    if !valid_password(&form.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password.".to_string()).into_response();
    }

    match credentials::register(&pool, &form.username, &form.password).await {
        // Registration doubles as the first login.
        Ok(RegisterOutcome::Created(user)) => {
            grant_session(&pool, &state, &headers, user.id, "/secrets").await
        }
        Ok(RegisterOutcome::Duplicate) => (
            StatusCode::CONFLICT,
            "Username already taken.".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Registration failed: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error registering user.".to_string(),
            )
                .into_response()
        }
    }
}
