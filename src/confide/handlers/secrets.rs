use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tracing::{error, instrument};

use super::{escape_html, page};
use crate::confide::auth::storage;

#[utoipa::path(
    get,
    path = "/secrets",
    responses(
        (status = 200, description = "Every submitted secret, anonymously", body = String, content_type = "text/html"),
        (status = 500, description = "Store unavailable", body = String),
    ),
    tag = "secrets"
)]
#[instrument(skip(pool))]
pub async fn secrets(pool: Extension<PgPool>) -> Response {
    let entries = match storage::list_secrets(&pool).await {
        Ok(entries) => entries,
        Err(err) => {
            error!("Failed to list secrets: {err:?}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error finding secrets.".to_string(),
            )
                .into_response();
        }
    };

    let body = if entries.is_empty() {
        "<p>No secrets yet. <a href=\"/submit\">Be the first.</a></p>".to_string()
    } else {
        let items: String = entries
            .iter()
            .map(|entry| format!("  <li>{}</li>\n", escape_html(&entry.secret)))
            .collect();
        format!("<ul>\n{items}</ul>\n<p><a href=\"/submit\">Share yours.</a></p>")
    };

    page("Secrets", &body).into_response()
}
