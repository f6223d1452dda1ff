//! Admin status of the current viewer.

use std::sync::Arc;

use techlog_core::UserId;

use crate::supabase::{AuthSession, AuthUser, DataBackend};

/// Asks the backend whether a session belongs to an admin.
///
/// Nothing is cached between calls.
#[derive(Clone)]
pub struct AuthorizationResolver {
    backend: Arc<dyn DataBackend>,
}

impl AuthorizationResolver {
    #[must_use]
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    /// Whether the session's user is an admin.
    ///
    /// Never fails: no session is `false` without a backend call, and any
    /// backend error is logged and read as `false`.
    pub async fn is_admin(&self, session: Option<&AuthSession>) -> bool {
        let Some(session) = session else {
            return false;
        };

        match self
            .backend
            .rpc_is_admin(Some(&session.access_token))
            .await
        {
            Ok(is_admin) => is_admin,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %session.user.id, "Error checking admin status");
                false
            }
        }
    }

    /// Resolve the viewer for one request.
    pub async fn resolve(&self, session: Option<AuthSession>) -> Viewer {
        let is_admin = self.is_admin(session.as_ref()).await;
        Viewer { session, is_admin }
    }
}

/// Who is looking at the page, resolved once per request.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    session: Option<AuthSession>,
    is_admin: bool,
}

impl Viewer {
    /// A visitor without a session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            session: None,
            is_admin: false,
        }
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user().map(|u| &u.id)
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::supabase::fake::InMemoryBackend;
    use techlog_core::Role;

    fn fixture() -> (Arc<InMemoryBackend>, AuthorizationResolver) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_user("admin@techlog.dev", "pw", Role::Admin);
        backend.add_user("editor@techlog.dev", "pw", Role::Other("editor".into()));
        let resolver = AuthorizationResolver::new(backend.clone());
        (backend, resolver)
    }

    #[tokio::test]
    async fn test_no_session_is_false_without_rpc() {
        let (backend, resolver) = fixture();
        assert!(!resolver.is_admin(None).await);
        assert_eq!(backend.is_admin_calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_and_non_admin() {
        let (backend, resolver) = fixture();
        let admin = backend.session_for("admin@techlog.dev").unwrap();
        let editor = backend.session_for("editor@techlog.dev").unwrap();
        assert!(resolver.is_admin(Some(&admin)).await);
        assert!(!resolver.is_admin(Some(&editor)).await);
    }

    #[tokio::test]
    async fn test_rpc_failure_fails_closed() {
        let (backend, resolver) = fixture();
        let admin = backend.session_for("admin@techlog.dev").unwrap();
        backend.set_fail_is_admin(true);
        assert!(!resolver.is_admin(Some(&admin)).await);
    }

    #[tokio::test]
    async fn test_resolved_viewer() {
        let (backend, resolver) = fixture();
        let admin = backend.session_for("admin@techlog.dev").unwrap();
        let viewer = resolver.resolve(Some(admin.clone())).await;
        assert!(viewer.is_signed_in());
        assert!(viewer.is_admin());
        assert_eq!(viewer.access_token(), Some(admin.access_token.as_str()));

        let anonymous = resolver.resolve(None).await;
        assert!(!anonymous.is_signed_in());
        assert!(!anonymous.is_admin());
    }
}
