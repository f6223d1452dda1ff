//! Home page: the article list, seeded on first visit.
//!
//! `loading -> ready | error`. An empty table may be seeded once per load
//! (list, seed, list again); retry and the reload after a delete both start
//! over from `loading`.

use techlog_core::UserId;

use super::article_card::ArticleCardView;
use crate::config::SeedPolicy;
use crate::services::{ContentRepository, SeedReport, Viewer};
use crate::supabase::Article;

/// Shown when the article list cannot be loaded.
pub const LOAD_ERROR: &str = "Failed to load articles. Please try again later.";

/// Home page state.
#[derive(Debug, Clone, Default)]
pub enum HomeState {
    #[default]
    Loading,
    Ready {
        articles: Vec<Article>,
        /// Set when this load seeded the example articles.
        seeded: Option<SeedReport>,
    },
    Error {
        message: String,
    },
}

/// Author to seed as, if the policy lets this viewer seed.
fn seed_author(policy: SeedPolicy, viewer: &Viewer) -> Option<&UserId> {
    match policy {
        SeedPolicy::Disabled => None,
        SeedPolicy::SignedIn => viewer.user_id(),
        SeedPolicy::Admin if viewer.is_admin() => viewer.user_id(),
        SeedPolicy::Admin => None,
    }
}

/// Drives the home page for one viewer.
pub struct HomeController<'a> {
    repo: ContentRepository<'a>,
    viewer: &'a Viewer,
    seed_policy: SeedPolicy,
    state: HomeState,
}

impl<'a> HomeController<'a> {
    #[must_use]
    pub const fn new(
        repo: ContentRepository<'a>,
        viewer: &'a Viewer,
        seed_policy: SeedPolicy,
    ) -> Self {
        Self {
            repo,
            viewer,
            seed_policy,
            state: HomeState::Loading,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &HomeState {
        &self.state
    }

    /// Load the list, seeding an empty blog when allowed.
    ///
    /// Retry and the reload after a delete both come back through here.
    pub async fn load(&mut self) -> &HomeState {
        self.state = HomeState::Loading;
        self.state = match self.fetch().await {
            Ok((articles, seeded)) => HomeState::Ready { articles, seeded },
            Err(e) => {
                tracing::error!(error = %e, "Error loading articles");
                HomeState::Error {
                    message: LOAD_ERROR.to_string(),
                }
            }
        };
        &self.state
    }

    async fn fetch(
        &self,
    ) -> Result<(Vec<Article>, Option<SeedReport>), crate::services::ContentError> {
        let articles = self.repo.list_articles().await?;
        if !articles.is_empty() {
            return Ok((articles, None));
        }
        let Some(author) = seed_author(self.seed_policy, self.viewer) else {
            return Ok((articles, None));
        };

        let report = self.repo.seed_examples(author).await;
        tracing::info!(
            inserted = report.inserted,
            failed = report.failed,
            "Seeded empty blog"
        );
        let articles = self.repo.list_articles().await?;
        Ok((articles, Some(report)))
    }
}

/// Template-ready article list.
#[derive(Debug, Clone, Default)]
pub struct ArticleListView {
    pub cards: Vec<ArticleCardView>,
    pub error: Option<String>,
    pub is_admin: bool,
}

impl ArticleListView {
    #[must_use]
    pub fn from_state(state: &HomeState, viewer: &Viewer) -> Self {
        let is_admin = viewer.is_admin();
        match state {
            HomeState::Loading => Self {
                is_admin,
                ..Self::default()
            },
            HomeState::Ready { articles, .. } => Self {
                cards: articles
                    .iter()
                    .map(|article| ArticleCardView::new(article, is_admin))
                    .collect(),
                error: None,
                is_admin,
            },
            HomeState::Error { message } => Self {
                cards: Vec::new(),
                error: Some(message.clone()),
                is_admin,
            },
        }
    }
}
