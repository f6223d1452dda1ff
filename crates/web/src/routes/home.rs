//! Home page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentViewer;
use crate::pages::{ArticleListView, HomeController, Navbar};
use crate::services::{ContentRepository, Viewer};
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub navbar: Navbar,
    pub list: ArticleListView,
}

/// Article list fragment, reloaded by HTMX after a delete.
#[derive(Template, WebTemplate)]
#[template(path = "partials/article_list.html")]
pub struct ArticleListTemplate {
    pub list: ArticleListView,
}

/// Run one home page load for the viewer.
pub(crate) async fn load_list(state: &AppState, viewer: &Viewer) -> ArticleListView {
    let repo = ContentRepository::new(state.data(), viewer.access_token());
    let mut home = HomeController::new(repo, viewer, state.config().seed_policy);
    home.load().await;
    ArticleListView::from_state(home.state(), viewer)
}

/// Display the home page.
#[instrument(skip(state, viewer))]
pub async fn home(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> HomeTemplate {
    HomeTemplate {
        navbar: Navbar::for_viewer(&viewer),
        list: load_list(&state, &viewer).await,
    }
}

/// Article list fragment (HTMX).
///
/// Also serves the retry button, which re-enters `loading`.
#[instrument(skip(state, viewer))]
pub async fn article_list(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> ArticleListTemplate {
    ArticleListTemplate {
        list: load_list(&state, &viewer).await,
    }
}
