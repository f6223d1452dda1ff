//! Admin dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentViewer;
use crate::pages::dashboard::{self, ADMIN_GUIDE_SQL};
use crate::pages::{DashboardView, Navbar};
use crate::services::ContentRepository;
use crate::state::AppState;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub navbar: Navbar,
    pub dashboard: DashboardView,
    pub guide_sql: &'static str,
}

/// Display the dashboard. Retry is a reload of this page.
#[instrument(skip(state, viewer))]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Response {
    if let Some(target) = dashboard::guard_redirect(&viewer) {
        return Redirect::to(target).into_response();
    }

    let repo = ContentRepository::new(state.data(), viewer.access_token());
    let loaded = dashboard::load(&repo).await;
    DashboardTemplate {
        navbar: Navbar::for_viewer(&viewer),
        dashboard: DashboardView::from_state(&loaded),
        guide_sql: ADMIN_GUIDE_SQL,
    }
    .into_response()
}
