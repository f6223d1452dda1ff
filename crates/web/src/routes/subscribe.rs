//! Newsletter subscription route handlers.
//!
//! The form posts through HTMX and swaps itself with the result fragment;
//! a plain form post gets the whole page back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentViewer;
use crate::pages::subscribe;
use crate::pages::{Navbar, SubscribeState};
use crate::services::ContentRepository;
use crate::state::AppState;

/// Subscribe form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

/// Subscribe page template.
#[derive(Template, WebTemplate)]
#[template(path = "subscribe.html")]
pub struct SubscribeTemplate {
    pub navbar: Navbar,
    pub form: SubscribeState,
}

/// Subscribe form fragment (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/subscribe_form.html")]
pub struct SubscribeFormTemplate {
    pub form: SubscribeState,
}

/// Display the subscribe page.
#[instrument(skip(viewer))]
pub async fn show(CurrentViewer(viewer): CurrentViewer) -> SubscribeTemplate {
    SubscribeTemplate {
        navbar: Navbar::for_viewer(&viewer),
        form: SubscribeState::Idle,
    }
}

/// Subscribe to the newsletter.
#[instrument(skip(state, viewer, headers, form))]
pub async fn submit(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    headers: HeaderMap,
    Form(form): Form<SubscribeForm>,
) -> Response {
    let repo = ContentRepository::new(state.data(), viewer.access_token());
    let result = subscribe::submit(&repo, form.email).await;

    if headers.contains_key("HX-Request") {
        SubscribeFormTemplate { form: result }.into_response()
    } else {
        SubscribeTemplate {
            navbar: Navbar::for_viewer(&viewer),
            form: result,
        }
        .into_response()
    }
}
