//! Viewer extractor.
//!
//! Resolves the current auth session and admin status once per request and
//! caches the result in request extensions, so the navbar, the page and every
//! article card share one `is_admin` round trip.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::services::Viewer;
use crate::state::AppState;

/// Extractor for the current viewer (anonymous if there is no session).
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentViewer(viewer): CurrentViewer) -> impl IntoResponse {
///     if viewer.is_admin() { "admin" } else { "reader" }
/// }
/// ```
pub struct CurrentViewer(pub Viewer);

impl FromRequestParts<AppState> for CurrentViewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(viewer) = parts.extensions.get::<Viewer>() {
            return Ok(Self(viewer.clone()));
        }

        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            tracing::warn!("No session layer in front of a viewer-aware route");
            return Ok(Self(Viewer::anonymous()));
        };

        let auth_session = state.session_store(session).current_session().await;
        let viewer = state.authz().resolve(auth_session).await;

        if let Some(user) = viewer.user() {
            set_sentry_user(&user.id, user.email.as_deref());
        }
        parts.extensions.insert(viewer.clone());
        Ok(Self(viewer))
    }
}
