//! Hosted backend access (auth service, table REST API and stored procedures).
//!
//! # Architecture
//!
//! - Two traits split the backend by concern: [`AuthBackend`] for account
//!   and token operations, [`DataBackend`] for rows and procedures
//! - [`SupabaseClient`] implements both over HTTP with `reqwest`
//! - An in-memory implementation backs the tests (feature `fake-backend`)
//!
//! Row-level access policies live in the backend. Every data call carries the
//! caller's access token (or none for anonymous visitors), so the database is
//! the final judge of what a caller may read or write.

mod client;
#[cfg(any(test, feature = "fake-backend"))]
pub mod fake;
pub mod types;

pub use client::SupabaseClient;
pub use types::*;

use async_trait::async_trait;
use secrecy::SecretString;
use techlog_core::{ArticleId, Email};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        /// Machine-readable code (Postgres SQLSTATE or auth error code).
        code: Option<String>,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The backend could not be reached or refused to serve the request.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether the backend rejected the caller's identity or privileges.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => {
                matches!(status, 401 | 403)
                    || matches!(code.as_deref(), Some("42501" | "PGRST301"))
            }
            _ => false,
        }
    }

    /// Whether the request collided with an existing row.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => *status == 409 || code.as_deref() == Some("23505"),
            _ => false,
        }
    }

    /// Whether the backend rejected the request payload itself.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => {
                matches!(status, 400 | 422)
                    || matches!(code.as_deref(), Some("22P02" | "23514" | "23502"))
            }
            _ => false,
        }
    }

    /// Whether the addressed row or endpoint does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// The backend's own message, if it sent one.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Account and token operations of the auth service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError>;

    /// Create an account.
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, BackendError>;

    /// Exchange a refresh token for a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;

    /// Look up the user an access token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    /// Send a password recovery email.
    async fn send_password_recovery(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), BackendError>;
}

/// Table and stored-procedure operations.
///
/// `auth` is the caller's access token; `None` means an anonymous request.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// All articles, newest first.
    async fn select_articles(&self, auth: Option<&str>) -> Result<Vec<Article>, BackendError>;

    /// Insert an article and return the stored row.
    async fn insert_article(
        &self,
        auth: Option<&str>,
        article: &NewArticle,
    ) -> Result<Article, BackendError>;

    /// Delete an article by id. Deleting a missing id is not an error.
    async fn delete_article(&self, auth: Option<&str>, id: &ArticleId)
    -> Result<(), BackendError>;

    /// All subscribers, newest first.
    async fn select_subscribers(&self, auth: Option<&str>)
    -> Result<Vec<Subscriber>, BackendError>;

    /// Insert a subscriber.
    ///
    /// Returns nothing: visitors may insert into the table but not read it
    /// back, so the row is never requested.
    async fn insert_subscriber(&self, auth: Option<&str>, email: &Email)
    -> Result<(), BackendError>;

    /// The `is_admin` procedure for the calling user.
    async fn rpc_is_admin(&self, auth: Option<&str>) -> Result<bool, BackendError>;

    /// The `get_admin_users` procedure (admin only).
    async fn rpc_get_admin_users(
        &self,
        auth: Option<&str>,
    ) -> Result<Vec<AdminUserView>, BackendError>;
}
