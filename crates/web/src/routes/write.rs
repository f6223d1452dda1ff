//! Write page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentViewer;
use crate::pages::write;
use crate::pages::{Navbar, WriteGuard, WriteState};
use crate::services::ContentRepository;
use crate::state::AppState;

/// Write form data.
#[derive(Debug, Deserialize)]
pub struct WriteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Write page template.
#[derive(Template, WebTemplate)]
#[template(path = "write.html")]
pub struct WriteTemplate {
    pub navbar: Navbar,
    pub title: String,
    pub content: String,
    pub error: Option<String>,
}

/// Display the write page.
#[instrument(skip(viewer))]
pub async fn show(CurrentViewer(viewer): CurrentViewer) -> Response {
    let guard = WriteGuard::check(&viewer);
    if let Some(target) = guard.redirect_target() {
        return Redirect::to(target).into_response();
    }
    WriteTemplate {
        navbar: Navbar::for_viewer(&viewer),
        title: String::new(),
        content: String::new(),
        error: None,
    }
    .into_response()
}

/// Publish an article.
#[instrument(skip(state, viewer, form), fields(title_len = form.title.len()))]
pub async fn publish(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Form(form): Form<WriteForm>,
) -> Response {
    let author = match WriteGuard::check(&viewer) {
        WriteGuard::Allowed { author } => author,
        WriteGuard::RedirectToLogin => return Redirect::to("/login").into_response(),
        WriteGuard::RedirectHome => return Redirect::to("/").into_response(),
    };

    let repo = ContentRepository::new(state.data(), viewer.access_token());
    match write::submit(&repo, &author, form.title, form.content).await {
        WriteState::Published { .. } => Redirect::to("/").into_response(),
        WriteState::Idle {
            title,
            content,
            error,
        } => WriteTemplate {
            navbar: Navbar::for_viewer(&viewer),
            title,
            content,
            error,
        }
        .into_response(),
    }
}
