//! Write page: admins publish new articles.
//!
//! While a submit is in flight the form's button is disabled in the browser
//! (`hx-disabled-elt`); the server only sees the idle and published ends.

use techlog_core::{ArticleDraft, DraftError, UserId};

use crate::services::{ContentError, ContentRepository, Viewer};
use crate::supabase::Article;

/// Shown when the article could not be saved.
pub const SAVE_ERROR: &str = "Failed to save article. Please try again.";

/// Outcome of the entry check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteGuard {
    /// Admin; articles are published under this id.
    Allowed { author: UserId },
    /// No session.
    RedirectToLogin,
    /// Signed in but not an admin.
    RedirectHome,
}

impl WriteGuard {
    #[must_use]
    pub fn check(viewer: &Viewer) -> Self {
        match viewer.user_id() {
            None => Self::RedirectToLogin,
            Some(_) if !viewer.is_admin() => Self::RedirectHome,
            Some(author) => Self::Allowed {
                author: author.clone(),
            },
        }
    }

    /// Where to send the viewer instead, if anywhere.
    #[must_use]
    pub const fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::Allowed { .. } => None,
            Self::RedirectToLogin => Some("/login"),
            Self::RedirectHome => Some("/"),
        }
    }
}

/// Write form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteState {
    /// Editing; the input survives a failed submit.
    Idle {
        title: String,
        content: String,
        error: Option<String>,
    },
    /// Saved; the viewer goes back to the home page.
    Published { article: Article },
}

fn draft_message(err: &DraftError) -> &'static str {
    match err {
        DraftError::EmptyTitle => "Please enter a title.",
        DraftError::EmptyContent => "Please write some content.",
    }
}

/// Submit the form as `author`.
pub async fn submit(
    repo: &ContentRepository<'_>,
    author: &UserId,
    title: String,
    content: String,
) -> WriteState {
    let draft = match ArticleDraft::new(&title, &content) {
        Ok(draft) => draft,
        Err(e) => {
            return WriteState::Idle {
                error: Some(draft_message(&e).to_string()),
                title,
                content,
            };
        }
    };

    match repo.create_article(&draft, author).await {
        Ok(article) => WriteState::Published { article },
        Err(e) => {
            match &e {
                ContentError::Authorization(_) => {
                    tracing::warn!(error = %e, "Article rejected by access rules");
                }
                _ => tracing::error!(error = %e, "Error saving article"),
            }
            WriteState::Idle {
                title,
                content,
                error: Some(SAVE_ERROR.to_string()),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::AuthorizationResolver;
    use crate::supabase::fake::InMemoryBackend;
    use std::sync::Arc;
    use techlog_core::Role;

    async fn setup() -> (Arc<InMemoryBackend>, Viewer, Viewer) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_user("admin@techlog.dev", "pw", Role::Admin);
        backend.add_user("reader@techlog.dev", "pw", Role::None);
        let resolver = AuthorizationResolver::new(backend.clone());
        let admin = resolver
            .resolve(Some(backend.session_for("admin@techlog.dev").unwrap()))
            .await;
        let reader = resolver
            .resolve(Some(backend.session_for("reader@techlog.dev").unwrap()))
            .await;
        (backend, admin, reader)
    }

    #[tokio::test]
    async fn test_guard() {
        let (_backend, admin, reader) = setup().await;
        assert!(matches!(WriteGuard::check(&admin), WriteGuard::Allowed { .. }));
        assert_eq!(WriteGuard::check(&reader), WriteGuard::RedirectHome);
        assert_eq!(
            WriteGuard::check(&Viewer::anonymous()).redirect_target(),
            Some("/login")
        );
    }

    #[tokio::test]
    async fn test_publish() {
        let (backend, admin, _reader) = setup().await;
        let repo = ContentRepository::new(backend.as_ref(), admin.access_token());
        let author = admin.user_id().unwrap();

        let state = submit(&repo, author, " Title ".into(), "Body".into()).await;
        let WriteState::Published { article } = state else {
            panic!("expected published");
        };
        assert_eq!(article.title, "Title");
        assert_eq!(&article.user_id, author);
    }

    #[tokio::test]
    async fn test_empty_title_keeps_input() {
        let (backend, admin, _reader) = setup().await;
        let repo = ContentRepository::new(backend.as_ref(), admin.access_token());

        let state = submit(&repo, admin.user_id().unwrap(), "  ".into(), "Body".into()).await;
        assert_eq!(
            state,
            WriteState::Idle {
                title: "  ".into(),
                content: "Body".into(),
                error: Some("Please enter a title.".into()),
            }
        );
        assert_eq!(backend.insert_article_calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_input() {
        let (backend, admin, _reader) = setup().await;
        backend.set_fail_insert_article(true);
        let repo = ContentRepository::new(backend.as_ref(), admin.access_token());

        let state = submit(&repo, admin.user_id().unwrap(), "T".into(), "C".into()).await;
        assert_eq!(
            state,
            WriteState::Idle {
                title: "T".into(),
                content: "C".into(),
                error: Some(SAVE_ERROR.into()),
            }
        );
    }
}
