//! HTTP route handlers for the blog.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                      - Home page
//! GET    /health                - Health check
//!
//! # Articles (HTMX fragments)
//! GET    /articles              - Article list fragment (reload target)
//! DELETE /articles/{id}         - Delete from a card (triggers articles-changed)
//! GET    /articles/{id}/delete  - Delete confirmation page (no-JS)
//! POST   /articles/{id}/delete  - Confirmed delete (no-JS)
//!
//! # Writing (admin only)
//! GET    /write                 - Write page
//! POST   /write                 - Publish article
//!
//! # Newsletter
//! GET    /subscribe             - Subscribe page
//! POST   /subscribe             - Subscribe (fragment for HTMX, page otherwise)
//!
//! # Auth
//! GET    /login                 - Login page (?view=sign_in|sign_up|forgotten_password)
//! POST   /login                 - Sign in
//! POST   /login/signup          - Sign up
//! POST   /login/recover         - Send password recovery email
//! POST   /logout                - Sign out
//!
//! # Admin
//! GET    /admin                 - Dashboard
//! ```
//!
//! Anything else redirects home.

pub mod admin;
pub mod articles;
pub mod auth;
pub mod home;
pub mod subscribe;
pub mod write;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Static assets shipped with the crate.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the article routes router.
pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::article_list))
        .route("/{id}", axum::routing::delete(articles::delete))
        .route(
            "/{id}/delete",
            get(articles::confirm_page).post(articles::confirm_delete),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/login/signup", post(auth::signup))
        .route("/login/recover", post(auth::recover))
        .route("/logout", post(auth::logout))
}

/// Create all page routes for the blog.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/articles", article_routes())
        .route("/write", get(write::show).post(write::publish))
        .route("/subscribe", get(subscribe::show).post(subscribe::submit))
        .route("/admin", get(admin::dashboard))
        .merge(auth_routes())
}

/// Build the complete application: routes, static files, sessions,
/// request logging and request ids.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(|| async { Redirect::to("/") })
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
