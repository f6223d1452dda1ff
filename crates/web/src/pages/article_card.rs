//! A single article in the list, with its delete workflow.
//!
//! Delete goes `idle -> confirming -> deleting -> removed`, or back to an
//! idle-looking `failed` phase carrying a message. The `deleting` phase lasts
//! [`EXIT_TRANSITION`] before the backend is asked, which is the time the card
//! takes to collapse on screen.

use std::time::Duration;

use techlog_core::ArticleId;

use crate::services::ContentRepository;
use crate::supabase::Article;

/// How long the card's exit transition runs before the delete is sent.
pub const EXIT_TRANSITION: Duration = Duration::from_millis(500);

/// Shown on the card when the delete fails.
pub const DELETE_ERROR: &str = "Failed to delete article. Please try again.";

/// Delete workflow phase of one card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardPhase {
    #[default]
    Idle,
    Confirming,
    Deleting,
    Removed,
    Failed {
        message: String,
    },
}

/// Input to the card's state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    RequestDelete,
    Cancel,
    Confirm,
    Deleted,
    DeleteFailed(String),
}

impl CardPhase {
    /// Apply an event. Events that make no sense in the current phase leave
    /// it unchanged.
    #[must_use]
    pub fn next(self, event: CardEvent) -> Self {
        match (self, event) {
            (Self::Idle | Self::Failed { .. }, CardEvent::RequestDelete) => Self::Confirming,
            (Self::Confirming, CardEvent::Cancel) => Self::Idle,
            (Self::Confirming, CardEvent::Confirm) => Self::Deleting,
            (Self::Deleting, CardEvent::Deleted) => Self::Removed,
            (Self::Deleting, CardEvent::DeleteFailed(message)) => Self::Failed { message },
            (phase, _) => phase,
        }
    }
}

/// Template-ready card.
#[derive(Debug, Clone)]
pub struct ArticleCardView {
    pub id: String,
    pub title: String,
    pub content: String,
    /// e.g. "February 15, 2025"
    pub date: String,
    /// e.g. "10:00"
    pub time: String,
    /// Machine-readable timestamp for `<time datetime>`.
    pub datetime: String,
    pub can_delete: bool,
    pub phase: CardPhase,
}

impl ArticleCardView {
    /// Build a card. The delete affordance follows the viewer's admin status.
    #[must_use]
    pub fn new(article: &Article, viewer_is_admin: bool) -> Self {
        Self {
            id: article.id.to_string(),
            title: article.title.clone(),
            content: article.content.clone(),
            date: article.created_at.format("%B %-d, %Y").to_string(),
            time: article.created_at.format("%H:%M").to_string(),
            datetime: article.created_at.to_rfc3339(),
            can_delete: viewer_is_admin,
            phase: CardPhase::Idle,
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: CardPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Message to show on the card, if the last delete failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            CardPhase::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Run a confirmed delete: wait out the exit transition, then delete.
///
/// Returns [`CardPhase::Removed`] on success (including an already missing
/// article) and [`CardPhase::Failed`] otherwise.
pub async fn confirm_delete(
    repo: &ContentRepository<'_>,
    id: &ArticleId,
    exit_transition: Duration,
) -> CardPhase {
    let phase = CardPhase::Confirming.next(CardEvent::Confirm);
    tokio::time::sleep(exit_transition).await;

    match repo.delete_article(id).await {
        Ok(()) => phase.next(CardEvent::Deleted),
        Err(e) => {
            tracing::error!(error = %e, article_id = %id, "Error deleting article");
            phase.next(CardEvent::DeleteFailed(DELETE_ERROR.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::supabase::fake::InMemoryBackend;
    use chrono::TimeZone;
    use techlog_core::{Role, UserId};

    fn article() -> Article {
        Article {
            id: ArticleId::new("a1"),
            title: "Kafka".into(),
            content: "  indented".into(),
            created_at: chrono::Utc
                .with_ymd_and_hms(2025, 2, 15, 10, 0, 0)
                .single()
                .unwrap(),
            user_id: UserId::new("u1"),
        }
    }

    #[test]
    fn test_card_formats_dates() {
        let card = ArticleCardView::new(&article(), false);
        assert_eq!(card.date, "February 15, 2025");
        assert_eq!(card.time, "10:00");
        assert!(!card.can_delete);
    }

    #[test]
    fn test_phase_transitions() {
        let phase = CardPhase::Idle.next(CardEvent::RequestDelete);
        assert_eq!(phase, CardPhase::Confirming);
        assert_eq!(phase.clone().next(CardEvent::Cancel), CardPhase::Idle);
        let deleting = phase.next(CardEvent::Confirm);
        assert_eq!(deleting, CardPhase::Deleting);
        assert_eq!(
            deleting.clone().next(CardEvent::DeleteFailed("x".into())),
            CardPhase::Failed {
                message: "x".into()
            }
        );
        assert_eq!(deleting.next(CardEvent::Deleted), CardPhase::Removed);
    }

    #[test]
    fn test_idle_ignores_confirm() {
        assert_eq!(CardPhase::Idle.next(CardEvent::Confirm), CardPhase::Idle);
    }

    #[tokio::test]
    async fn test_confirm_delete_removes() {
        let backend = InMemoryBackend::new();
        let admin_id = backend.add_user("admin@techlog.dev", "pw", Role::Admin);
        let session = backend.session_for("admin@techlog.dev").unwrap();
        let stored = backend.insert_article_row("Kafka", "body", &admin_id);
        let repo = ContentRepository::new(&backend, Some(session.access_token.as_str()));

        let phase = confirm_delete(&repo, &stored.id, Duration::ZERO).await;
        assert_eq!(phase, CardPhase::Removed);
        assert!(backend.articles().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_delete_failure_keeps_article() {
        let backend = InMemoryBackend::new();
        let admin_id = backend.add_user("admin@techlog.dev", "pw", Role::Admin);
        let session = backend.session_for("admin@techlog.dev").unwrap();
        let stored = backend.insert_article_row("Kafka", "body", &admin_id);
        backend.set_fail_delete_article(true);
        let repo = ContentRepository::new(&backend, Some(session.access_token.as_str()));

        let phase = confirm_delete(&repo, &stored.id, Duration::ZERO).await;
        assert_eq!(
            phase,
            CardPhase::Failed {
                message: DELETE_ERROR.into()
            }
        );
        assert_eq!(backend.articles().len(), 1);
    }
}
