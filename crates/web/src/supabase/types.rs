//! Row and auth payload types exchanged with the hosted backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use techlog_core::{ArticleId, Email, Role, SubscriberId, UserId};

/// Seconds before the real expiry at which a session counts as expired.
const EXPIRY_BUFFER_SECS: i64 = 60;

// =============================================================================
// Table rows
// =============================================================================

/// A published article as stored in the `articles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
}

/// Insert payload for the `articles` table.
///
/// `created_at` is left to the database default unless set (seeding uses
/// fixed timestamps so the example articles keep their historic dates).
#[derive(Debug, Clone, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A newsletter subscriber row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// One row of the `get_admin_users` procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserView {
    pub id: UserId,
    /// Missing for phone and OAuth-only accounts.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Auth
// =============================================================================

/// Server-controlled metadata attached to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Role,
}

/// The authenticated account as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

/// A signed-in session: the bearer token pair plus the user it belongs to.
///
/// Stored in the cookie session between requests. `Debug` is implemented
/// manually so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) when the access token expires.
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    /// Check if the access token is expired or about to expire.
    ///
    /// Treats tokens expiring within the next minute as expired so a request
    /// never starts with a token that dies halfway through.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Same as [`Self::is_expired`] against an explicit clock.
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at - EXPIRY_BUFFER_SECS
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Response body of the token endpoints (password grant and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    /// Convert into a session, computing the expiry if the server omitted it.
    #[must_use]
    pub fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + self.expires_in);
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account was created and signed in right away.
    SignedIn(AuthSession),
    /// The account was created but the email address must be confirmed first.
    ConfirmationRequired { email: Email },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "access-secret".to_string(),
            refresh_token: "refresh-secret".to_string(),
            expires_at,
            user: AuthUser {
                id: UserId::new("u1"),
                email: Some("reader@example.com".to_string()),
                app_metadata: AppMetadata::default(),
            },
        }
    }

    #[test]
    fn test_expiry_buffer() {
        let s = session(1_000);
        assert!(!s.is_expired_at(900));
        assert!(s.is_expired_at(940));
        assert!(s.is_expired_at(2_000));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let output = format!("{:?}", session(0));
        assert!(!output.contains("access-secret"));
        assert!(!output.contains("refresh-secret"));
        assert!(output.contains("[REDACTED]"));
    }

    #[test]
    fn test_auth_user_without_role() {
        let user: AuthUser =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.co","app_metadata":{}}"#).unwrap();
        assert_eq!(user.app_metadata.role, Role::None);

        let user: AuthUser = serde_json::from_str(
            r#"{"id":"u2","app_metadata":{"provider":"email","role":"admin"}}"#,
        )
        .unwrap();
        assert!(user.app_metadata.role.is_admin());
        assert!(user.email.is_none());
    }

    #[test]
    fn test_admin_view_missing_role_is_user() {
        let row: AdminUserView = serde_json::from_str(
            r#"{"id":"u1","email":"a@b.co","role":null,"created_at":"2025-02-15T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(row.role.label(), "user");
    }

    #[test]
    fn test_admin_view_list_tolerates_missing_email() {
        let rows: Vec<AdminUserView> = serde_json::from_str(
            r#"[
                {"id":"u1","email":"admin@b.co","role":"admin","created_at":"2025-02-15T10:00:00Z"},
                {"id":"u2","email":null,"role":null,"created_at":"2025-02-16T10:00:00Z"},
                {"id":"u3","role":null,"created_at":"2025-02-17T10:00:00Z"}
            ]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].email.as_deref(), Some("admin@b.co"));
        assert!(rows[1].email.is_none());
        assert!(rows[2].email.is_none());
    }

    #[test]
    fn test_new_article_omits_unset_timestamp() {
        let new = NewArticle {
            title: "t".to_string(),
            content: "c".to_string(),
            user_id: UserId::new("u1"),
            created_at: None,
        };
        let json = serde_json::to_value(&new).unwrap();
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_token_response_computes_expiry() {
        let body = r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"user":{"id":"u1"}}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        let before = Utc::now().timestamp();
        let session = token.into_session();
        assert!(session.expires_at >= before + 3600);
        assert!(!session.is_expired());
    }
}
