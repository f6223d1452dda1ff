//! Article delete route handlers.
//!
//! Cards delete through HTMX: the card collapses while the request is in
//! flight, an empty response removes it and `HX-Trigger: articles-changed`
//! makes the list reload. Without JavaScript the card links to a
//! confirmation page instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use techlog_core::ArticleId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CurrentViewer;
use crate::pages::article_card::{self, CardEvent, CardPhase, EXIT_TRANSITION};
use crate::pages::{ArticleCardView, Navbar};
use crate::services::{ContentRepository, Viewer};
use crate::state::AppState;

/// HTMX event that reloads the article list.
pub const ARTICLES_CHANGED: &str = "articles-changed";

/// A single card, re-rendered when its delete failed.
#[derive(Template, WebTemplate)]
#[template(path = "partials/article_card.html")]
pub struct ArticleCardTemplate {
    pub card: ArticleCardView,
}

/// Delete confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub navbar: Navbar,
    pub card: ArticleCardView,
}

/// Find one article's card by re-reading the list.
async fn find_card(
    repo: &ContentRepository<'_>,
    id: &ArticleId,
    viewer: &Viewer,
) -> Option<ArticleCardView> {
    match repo.list_articles().await {
        Ok(articles) => articles
            .iter()
            .find(|article| &article.id == id)
            .map(|article| ArticleCardView::new(article, viewer.is_admin())),
        Err(e) => {
            tracing::warn!(error = %e, article_id = %id, "Could not reload article");
            None
        }
    }
}

/// Delete an article from its card (HTMX).
#[instrument(skip(state, viewer))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<String>,
) -> Result<Response> {
    if !viewer.is_admin() {
        return Err(AppError::Forbidden("Only admins can delete articles".to_string()));
    }

    let id = ArticleId::new(id);
    let repo = ContentRepository::new(state.data(), viewer.access_token());
    let phase = article_card::confirm_delete(&repo, &id, EXIT_TRANSITION).await;

    if phase == CardPhase::Removed {
        return Ok((AppendHeaders([("HX-Trigger", ARTICLES_CHANGED)]), "").into_response());
    }

    // Put the card back with the error, or reload the list if it is gone.
    match find_card(&repo, &id, &viewer).await {
        Some(card) => Ok(ArticleCardTemplate {
            card: card.with_phase(phase),
        }
        .into_response()),
        None => Ok((AppendHeaders([("HX-Trigger", ARTICLES_CHANGED)]), "").into_response()),
    }
}

/// Delete confirmation page (no JavaScript).
#[instrument(skip(state, viewer))]
pub async fn confirm_page(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<String>,
) -> Response {
    if !viewer.is_admin() {
        return Redirect::to("/").into_response();
    }

    let id = ArticleId::new(id);
    let repo = ContentRepository::new(state.data(), viewer.access_token());
    match find_card(&repo, &id, &viewer).await {
        Some(card) => ConfirmDeleteTemplate {
            navbar: Navbar::for_viewer(&viewer),
            card: card.with_phase(CardPhase::Idle.next(CardEvent::RequestDelete)),
        }
        .into_response(),
        None => Redirect::to("/").into_response(),
    }
}

/// Confirmed delete (no JavaScript).
#[instrument(skip(state, viewer))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<String>,
) -> Response {
    if !viewer.is_admin() {
        return Redirect::to("/").into_response();
    }

    let id = ArticleId::new(id);
    let repo = ContentRepository::new(state.data(), viewer.access_token());
    let phase = article_card::confirm_delete(&repo, &id, std::time::Duration::ZERO).await;
    if phase == CardPhase::Removed {
        return Redirect::to("/").into_response();
    }

    match find_card(&repo, &id, &viewer).await {
        Some(card) => ConfirmDeleteTemplate {
            navbar: Navbar::for_viewer(&viewer),
            card: card.with_phase(phase),
        }
        .into_response(),
        None => Redirect::to("/").into_response(),
    }
}
