//! OpenAPI document for the HTTP surface, served at `/openapi.json`.

use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::confide::handlers;

#[derive(OpenApi)]
#[openapi(
    info(description = "Share a secret without a name"),
    paths(
        handlers::health::health,
        handlers::home::home,
        handlers::login::login_form,
        handlers::login::login,
        handlers::register::register_form,
        handlers::register::register,
        handlers::secrets::secrets,
        handlers::submit::submit_form,
        handlers::submit::submit,
        handlers::logout::logout,
        handlers::google::google_redirect,
        handlers::google::google_callback,
    ),
    components(schemas(
        handlers::login::LoginForm,
        handlers::register::RegisterForm,
        handlers::submit::SubmitForm,
    )),
    tags(
        (name = "pages", description = "Public HTML pages"),
        (name = "auth", description = "Login, registration, OAuth, logout"),
        (name = "secrets", description = "Submitting and listing secrets"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

pub async fn serve() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_the_surface() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/health",
            "/login",
            "/register",
            "/secrets",
            "/submit",
            "/logout",
            "/auth/google",
            "/auth/google/secrets",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
