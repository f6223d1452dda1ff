//! Access to articles, subscribers and accounts stored in the backend.
//!
//! The repository is a thin pass-through: the backend owns the rows and
//! enforces who may touch them. What this layer adds is input validation,
//! ordering, and a small error taxonomy pages can turn into messages.

use techlog_core::{ArticleDraft, ArticleId, DraftError, Email, EmailError, UserId};
use thiserror::Error;
use tracing::instrument;

use super::seed::EXAMPLE_ARTICLES;
use crate::supabase::{AdminUserView, Article, BackendError, DataBackend, NewArticle, Subscriber};

/// Failure of a repository operation.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The input was rejected (empty field, malformed or duplicate email).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend refused the caller's role.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// The row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Talking to the backend failed.
    #[error("Backend error: {0}")]
    Transient(BackendError),
}

impl From<BackendError> for ContentError {
    fn from(err: BackendError) -> Self {
        if err.is_authorization() {
            Self::Authorization(err.to_string())
        } else if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else if err.is_conflict() {
            Self::Validation("already exists".to_string())
        } else if err.is_invalid_input() {
            Self::Validation(
                err.api_message()
                    .map_or_else(|| err.to_string(), String::from),
            )
        } else {
            Self::Transient(err)
        }
    }
}

impl From<DraftError> for ContentError {
    fn from(err: DraftError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for ContentError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Outcome of seeding the example articles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub failed: usize,
}

/// Repository bound to one caller.
///
/// `access_token` is the caller's bearer token, `None` for anonymous visitors.
pub struct ContentRepository<'a> {
    backend: &'a dyn DataBackend,
    access_token: Option<&'a str>,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn DataBackend, access_token: Option<&'a str>) -> Self {
        Self {
            backend,
            access_token,
        }
    }

    /// All articles, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Transient`] when the backend fails.
    #[instrument(skip(self))]
    pub async fn list_articles(&self) -> Result<Vec<Article>, ContentError> {
        let mut articles = self.backend.select_articles(self.access_token).await?;
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }

    /// Publish a draft as `author`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Authorization`] when the caller is not an
    /// admin, [`ContentError::Validation`] when the backend rejects the row.
    #[instrument(skip(self, draft), fields(title = %draft.title()))]
    pub async fn create_article(
        &self,
        draft: &ArticleDraft,
        author: &UserId,
    ) -> Result<Article, ContentError> {
        let new = NewArticle {
            title: draft.title().to_string(),
            content: draft.content().to_string(),
            user_id: author.clone(),
            created_at: None,
        };
        let article = self.backend.insert_article(self.access_token, &new).await?;
        tracing::info!(article_id = %article.id, "Article published");
        Ok(article)
    }

    /// Delete an article. A missing id counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Authorization`] when the caller is not an
    /// admin, [`ContentError::Transient`] when the backend fails.
    #[instrument(skip(self))]
    pub async fn delete_article(&self, id: &ArticleId) -> Result<(), ContentError> {
        match self.backend.delete_article(self.access_token, id).await {
            Ok(()) => {
                tracing::info!(article_id = %id, "Article deleted");
                Ok(())
            }
            Err(e) => match ContentError::from(e) {
                ContentError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    /// All subscribers, newest first (admins only).
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Authorization`] for non-admins and
    /// [`ContentError::Transient`] when the backend fails.
    #[instrument(skip(self))]
    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>, ContentError> {
        let mut subscribers = self.backend.select_subscribers(self.access_token).await?;
        subscribers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subscribers)
    }

    /// Add an email address to the mailing list.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Validation`] for a malformed or already
    /// subscribed address, [`ContentError::Transient`] when the backend fails.
    #[instrument(skip(self))]
    pub async fn create_subscriber(&self, email: &str) -> Result<Email, ContentError> {
        let email = Email::parse_input(email)?;
        self.backend
            .insert_subscriber(self.access_token, &email)
            .await?;
        tracing::info!(domain = email.domain(), "New subscriber");
        Ok(email)
    }

    /// Accounts with their roles (admins only).
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Authorization`] for non-admins and
    /// [`ContentError::Transient`] when the backend fails.
    #[instrument(skip(self))]
    pub async fn list_admin_users(&self) -> Result<Vec<AdminUserView>, ContentError> {
        Ok(self.backend.rpc_get_admin_users(self.access_token).await?)
    }

    /// Insert the example articles, tagged with `author`.
    ///
    /// Each insert stands alone: a failure is logged and counted, and the
    /// next article is still attempted.
    #[instrument(skip(self))]
    pub async fn seed_examples(&self, author: &UserId) -> SeedReport {
        let mut report = SeedReport::default();
        for example in &EXAMPLE_ARTICLES {
            let new = NewArticle {
                title: example.title.to_string(),
                content: example.content.to_string(),
                user_id: author.clone(),
                created_at: example.created_at(),
            };
            match self.backend.insert_article(self.access_token, &new).await {
                Ok(article) => {
                    tracing::info!(article_id = %article.id, title = example.title, "Seeded article");
                    report.inserted += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, title = example.title, "Error seeding article");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::supabase::fake::InMemoryBackend;
    use crate::supabase::AuthSession;
    use techlog_core::Role;

    fn backend_with_admin() -> (InMemoryBackend, AuthSession) {
        let backend = InMemoryBackend::new();
        backend.add_user("admin@techlog.dev", "pw-admin", Role::Admin);
        backend.add_user("reader@techlog.dev", "pw-reader", Role::None);
        let session = backend.session_for("admin@techlog.dev").unwrap();
        (backend, session)
    }

    #[tokio::test]
    async fn test_new_article_is_listed_first() {
        let (backend, admin) = backend_with_admin();
        backend.insert_article_row("Older", "body", &admin.user.id);
        let repo = ContentRepository::new(&backend, Some(admin.access_token.as_str()));

        let draft = ArticleDraft::new("Fresh", "text").unwrap();
        let created = repo.create_article(&draft, &admin.user.id).await.unwrap();

        let articles = repo.list_articles().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, created.id);
        assert!(articles.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_non_admin_create_is_authorization_error() {
        let (backend, _admin) = backend_with_admin();
        let reader = backend.session_for("reader@techlog.dev").unwrap();
        let repo = ContentRepository::new(&backend, Some(reader.access_token.as_str()));

        let draft = ArticleDraft::new("Nope", "text").unwrap();
        let err = repo.create_article(&draft, &reader.user.id).await.unwrap_err();
        assert!(matches!(err, ContentError::Authorization(_)));
        assert!(backend.articles().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_success() {
        let (backend, admin) = backend_with_admin();
        let kept = backend.insert_article_row("Kept", "body", &admin.user.id);
        let repo = ContentRepository::new(&backend, Some(admin.access_token.as_str()));

        repo.delete_article(&ArticleId::new("does-not-exist"))
            .await
            .unwrap();

        let articles = repo.list_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_anonymous_delete_rejected() {
        let (backend, admin) = backend_with_admin();
        let article = backend.insert_article_row("Kept", "body", &admin.user.id);
        let repo = ContentRepository::new(&backend, None);

        let err = repo.delete_article(&article.id).await.unwrap_err();
        assert!(matches!(err, ContentError::Authorization(_)));
        assert_eq!(backend.articles().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_email_leaves_list_unchanged() {
        let (backend, _admin) = backend_with_admin();
        let repo = ContentRepository::new(&backend, None);

        let err = repo.create_subscriber("not-an-email").await.unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
        assert!(backend.subscribers().is_empty());

        repo.create_subscriber("Reader@Example.com").await.unwrap();
        assert_eq!(backend.subscribers().len(), 1);
        assert_eq!(backend.subscribers()[0].email.as_str(), "reader@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_validation_error() {
        let (backend, _admin) = backend_with_admin();
        let repo = ContentRepository::new(&backend, None);
        repo.create_subscriber("reader@example.com").await.unwrap();

        let err = repo
            .create_subscriber("reader@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
        assert_eq!(backend.subscribers().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_and_accounts_need_admin() {
        let (backend, admin) = backend_with_admin();
        let anonymous = ContentRepository::new(&backend, None);
        assert!(matches!(
            anonymous.list_subscribers().await.unwrap_err(),
            ContentError::Authorization(_)
        ));
        assert!(matches!(
            anonymous.list_admin_users().await.unwrap_err(),
            ContentError::Authorization(_)
        ));

        let repo = ContentRepository::new(&backend, Some(admin.access_token.as_str()));
        let users = repo.list_admin_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().any(|u| u.role.is_admin()));
    }

    #[tokio::test]
    async fn test_seed_tags_author_and_keeps_dates() {
        let (backend, admin) = backend_with_admin();
        let repo = ContentRepository::new(&backend, Some(admin.access_token.as_str()));

        let report = repo.seed_examples(&admin.user.id).await;
        assert_eq!(report, SeedReport { inserted: 2, failed: 0 });

        let articles = repo.list_articles().await.unwrap();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Golang Project Structure and Goroutines: A Practical Guide",
                "Understanding Kafka Partitions and Message Polling",
            ]
        );
        assert!(articles.iter().all(|a| a.user_id == admin.user.id));
    }

    #[tokio::test]
    async fn test_seed_failures_are_counted_not_fatal() {
        let (backend, _admin) = backend_with_admin();
        let reader = backend.session_for("reader@techlog.dev").unwrap();
        let repo = ContentRepository::new(&backend, Some(reader.access_token.as_str()));

        let report = repo.seed_examples(&reader.user.id).await;
        assert_eq!(report, SeedReport { inserted: 0, failed: 2 });
        assert_eq!(backend.insert_article_calls(), 2);
    }

    #[tokio::test]
    async fn test_backend_outage_is_transient() {
        let (backend, _admin) = backend_with_admin();
        backend.set_fail_list_articles(true);
        let repo = ContentRepository::new(&backend, None);
        assert!(matches!(
            repo.list_articles().await.unwrap_err(),
            ContentError::Transient(_)
        ));
    }
}
