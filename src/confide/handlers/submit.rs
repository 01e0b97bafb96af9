use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::page;
use crate::confide::auth::{session, storage};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubmitForm {
    secret: String,
}

#[utoipa::path(
    get,
    path = "/submit",
    responses(
        (status = 200, description = "Secret submission form", body = String, content_type = "text/html"),
        (status = 303, description = "Anonymous, redirected to the login page"),
    ),
    tag = "secrets"
)]
pub async fn submit_form(pool: Extension<PgPool>, headers: HeaderMap) -> Response {
    if let Err(response) = session::require_authenticated(&headers, &pool).await {
        return response;
    }

    page(
        "Share a secret",
        r#"<form method="post" action="/submit">
  <label>Your secret <input type="text" name="secret" required></label>
  <button type="submit">Submit</button>
</form>"#,
    )
    .into_response()
}

#[utoipa::path(
    post,
    path = "/submit",
    responses(
        (status = 303, description = "Secret stored (or anonymous, redirected to login)"),
        (status = 400, description = "Nothing to save", body = String),
    ),
    tag = "secrets"
)]
#[instrument(skip(pool, headers, payload))]
pub async fn submit(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Form<SubmitForm>>,
) -> Response {
    // Guard first: anonymous requests must never reach the store.
    let record = match session::require_authenticated(&headers, &pool).await {
        Ok(record) => record,
        Err(response) => return response,
    };

    let Some(Form(form)) = payload else {
        return unable_to_save();
    };

    let secret = form.secret.trim();
    if secret.is_empty() {
        return unable_to_save();
    }

    // Overwrite, last write wins; resubmitting the same text is a no-op.
    match storage::set_secret(&pool, record.user_id, secret).await {
        Ok(true) => Redirect::to("/secrets").into_response(),
        Ok(false) => unable_to_save(),
        Err(err) => {
            error!("Failed to store secret: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error submitting secret.".to_string(),
            )
                .into_response()
        }
    }
}

fn unable_to_save() -> Response {
    (
        StatusCode::BAD_REQUEST,
        "Unable to save secret.".to_string(),
    )
        .into_response()
}
