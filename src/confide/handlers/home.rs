use axum::response::IntoResponse;

use super::page;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing page", body = String, content_type = "text/html"),
    ),
    tag = "pages"
)]
pub async fn home() -> impl IntoResponse {
    page(
        "Confide",
        r#"<p>Share a secret without a name.</p>
<ul>
  <li><a href="/secrets">Browse secrets</a></li>
  <li><a href="/login">Log in</a></li>
  <li><a href="/register">Register</a></li>
  <li><a href="/auth/google">Sign in with Google</a></li>
</ul>"#,
    )
}
