//! Per-browser auth session and the auth state change stream.
//!
//! The browser's auth session (access token, refresh token, user) is cached in
//! the cookie session under [`session_keys::AUTH_SESSION`]. Reads come from
//! that cache; the auth service is contacted only to sign in or out, to sign
//! up, to send a recovery email, and to refresh an expired access token.
//!
//! Every change is published on an application-wide [`AuthEvents`] channel.

use std::sync::Arc;

use secrecy::SecretString;
use techlog_core::Email;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::session_keys;
use crate::supabase::{AuthBackend, AuthSession, BackendError, SignUpOutcome};

/// Buffered auth events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Kind of auth state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
        }
    }
}

impl std::fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An auth state change and the session after it (`None` once signed out).
#[derive(Debug, Clone)]
pub struct AuthStateChange {
    pub event: AuthEvent,
    pub session: Option<AuthSession>,
}

/// Application-wide auth change channel.
#[derive(Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthStateChange>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Start receiving changes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish a change. Having no subscribers is fine.
    pub fn emit(&self, event: AuthEvent, session: Option<AuthSession>) {
        let _ = self.sender.send(AuthStateChange { event, session });
    }
}

/// A live subscription to auth state changes.
///
/// Dropping it (or calling [`Self::unsubscribe`]) ends delivery.
pub struct SessionSubscription {
    receiver: broadcast::Receiver<AuthStateChange>,
}

impl SessionSubscription {
    /// Wait for the next change. Returns `None` once the channel is closed.
    pub async fn next(&mut self) -> Option<AuthStateChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving changes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The auth service rejected the email/password pair.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The input was rejected before or by the auth service.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The auth service could not be reached or failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The cookie session could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(#[from] tower_sessions::session::Error),
}

impl SessionError {
    /// Message safe to show on the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials(message) | Self::Validation(message) => message.clone(),
            Self::Backend(_) | Self::Storage(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

/// Classify an auth service error for a form submission.
fn rejected(err: BackendError, fallback: fn(String) -> SessionError) -> SessionError {
    if err.is_invalid_input() || err.is_authorization() {
        let message = err
            .api_message()
            .map_or_else(|| "Request was rejected".to_string(), String::from);
        fallback(message)
    } else {
        SessionError::Backend(err)
    }
}

/// Auth session of one browser.
pub struct SessionStore {
    auth: Arc<dyn AuthBackend>,
    session: Session,
    events: AuthEvents,
}

impl SessionStore {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthBackend>, session: Session, events: AuthEvents) -> Self {
        Self {
            auth,
            session,
            events,
        }
    }

    /// The current auth session, refreshed first if its access token expired.
    ///
    /// A refresh that fails signs the browser out. Storage errors are logged
    /// and read as "no session".
    pub async fn current_session(&self) -> Option<AuthSession> {
        let cached = match self
            .session
            .get::<AuthSession>(session_keys::AUTH_SESSION)
            .await
        {
            Ok(cached) => cached?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read auth session");
                return None;
            }
        };

        if !cached.is_expired() {
            return Some(cached);
        }

        match self.auth.refresh_session(&cached.refresh_token).await {
            Ok(refreshed) => {
                if let Err(e) = self.store(&refreshed).await {
                    tracing::warn!(error = %e, "Failed to store refreshed session");
                }
                tracing::debug!(user_id = %refreshed.user.id, "Access token refreshed");
                self.events
                    .emit(AuthEvent::TokenRefreshed, Some(refreshed.clone()));
                Some(refreshed)
            }
            Err(e) => {
                tracing::info!(error = %e, user_id = %cached.user.id, "Token refresh failed, signing out");
                self.clear_local().await;
                None
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] for a malformed email,
    /// [`SessionError::InvalidCredentials`] when the auth service rejects the
    /// pair, and a backend or storage error otherwise.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<AuthSession, SessionError> {
        let email = Email::parse_input(email).map_err(|e| SessionError::Validation(e.to_string()))?;
        let auth_session = self
            .auth
            .sign_in_with_password(&email, &password)
            .await
            .map_err(|e| rejected(e, SessionError::InvalidCredentials))?;

        // New identity, new session id.
        self.session.cycle_id().await?;
        self.store(&auth_session).await?;
        set_sentry_user(&auth_session.user.id, auth_session.user.email.as_deref());
        self.events
            .emit(AuthEvent::SignedIn, Some(auth_session.clone()));
        Ok(auth_session)
    }

    /// Create an account. Signs in right away unless confirmation is required.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] for a malformed email or a
    /// rejected password, and a backend or storage error otherwise.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<SignUpOutcome, SessionError> {
        let email = Email::parse_input(email).map_err(|e| SessionError::Validation(e.to_string()))?;
        let outcome = self
            .auth
            .sign_up(&email, &password)
            .await
            .map_err(|e| rejected(e, SessionError::Validation))?;

        if let SignUpOutcome::SignedIn(auth_session) = &outcome {
            self.session.cycle_id().await?;
            self.store(auth_session).await?;
            set_sentry_user(&auth_session.user.id, auth_session.user.email.as_deref());
            self.events
                .emit(AuthEvent::SignedIn, Some(auth_session.clone()));
        }
        Ok(outcome)
    }

    /// Sign out.
    ///
    /// Revoking the token remotely is best effort; the local session is
    /// cleared regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let cached = self
            .session
            .get::<AuthSession>(session_keys::AUTH_SESSION)
            .await
            .ok()
            .flatten();

        if let Some(cached) = cached
            && let Err(e) = self.auth.sign_out(&cached.access_token).await
        {
            tracing::warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
        }

        self.clear_local().await;
    }

    /// Send a password recovery email.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Validation`] for a malformed email and a
    /// backend error when the auth service fails.
    #[instrument(skip(self))]
    pub async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), SessionError> {
        let email = Email::parse_input(email).map_err(|e| SessionError::Validation(e.to_string()))?;
        self.auth
            .send_password_recovery(&email, redirect_to)
            .await
            .map_err(|e| rejected(e, SessionError::Validation))
    }

    /// Subscribe to auth state changes.
    #[must_use]
    pub fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }

    async fn store(&self, auth_session: &AuthSession) -> Result<(), SessionError> {
        self.session
            .insert(session_keys::AUTH_SESSION, auth_session)
            .await?;
        Ok(())
    }

    /// Drop the cached tokens and announce the sign-out.
    async fn clear_local(&self) {
        if let Err(e) = self
            .session
            .remove::<AuthSession>(session_keys::AUTH_SESSION)
            .await
        {
            tracing::warn!(error = %e, "Failed to clear auth session");
        }
        clear_sentry_user();
        self.events.emit(AuthEvent::SignedOut, None);
    }
}

/// Log every auth state change for the lifetime of the application.
pub fn spawn_auth_listener(events: &AuthEvents) -> JoinHandle<()> {
    let mut subscription = events.subscribe();
    tokio::spawn(async move {
        while let Some(change) = subscription.next().await {
            match &change.session {
                Some(session) => tracing::info!(
                    event = %change.event,
                    user_id = %session.user.id,
                    "Auth state changed"
                ),
                None => tracing::info!(event = %change.event, "Auth state changed"),
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::supabase::fake::InMemoryBackend;
    use techlog_core::Role;
    use tower_sessions::MemoryStore;

    fn fixture() -> (Arc<InMemoryBackend>, SessionStore, Session) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_user("admin@techlog.dev", "correct horse", Role::Admin);
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = SessionStore::new(backend.clone(), session.clone(), AuthEvents::new());
        (backend, store, session)
    }

    #[tokio::test]
    async fn test_sign_in_caches_session_and_emits() {
        let (_backend, store, _session) = fixture();
        let mut changes = store.on_session_change();

        let signed_in = store
            .sign_in("Admin@TechLog.dev", SecretString::from("correct horse"))
            .await
            .unwrap();

        let current = store.current_session().await.unwrap();
        assert_eq!(current, signed_in);
        let change = changes.next().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedIn);
        assert!(change.session.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let (_backend, store, _session) = fixture();
        let err = store
            .sign_in("admin@techlog.dev", SecretString::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials(_)));
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert!(store.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_email_never_reaches_backend() {
        let (_backend, store, _session) = fixture();
        let err = store
            .sign_in("not-an-email", SecretString::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sign_out_clears_cache_even_if_remote_fails() {
        let (backend, store, session) = fixture();
        store
            .sign_in("admin@techlog.dev", SecretString::from("correct horse"))
            .await
            .unwrap();
        backend.set_fail_sign_out(true);
        let mut changes = store.on_session_change();

        store.sign_out().await;

        assert!(store.current_session().await.is_none());
        assert!(
            session
                .get::<AuthSession>(session_keys::AUTH_SESSION)
                .await
                .unwrap()
                .is_none()
        );
        let change = changes.next().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedOut);
        assert!(change.session.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_revokes_remote_token() {
        let (backend, store, _session) = fixture();
        let signed_in = store
            .sign_in("admin@techlog.dev", SecretString::from("correct horse"))
            .await
            .unwrap();
        store.sign_out().await;
        assert!(!backend.is_token_active(&signed_in.access_token));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let (_backend, store, session) = fixture();
        let mut signed_in = store
            .sign_in("admin@techlog.dev", SecretString::from("correct horse"))
            .await
            .unwrap();
        signed_in.expires_at = 0;
        session
            .insert(session_keys::AUTH_SESSION, &signed_in)
            .await
            .unwrap();
        let mut changes = store.on_session_change();

        let current = store.current_session().await.unwrap();

        assert_ne!(current.access_token, signed_in.access_token);
        assert!(!current.is_expired());
        assert_eq!(
            changes.next().await.unwrap().event,
            AuthEvent::TokenRefreshed
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_signs_out() {
        let (backend, store, session) = fixture();
        let mut signed_in = store
            .sign_in("admin@techlog.dev", SecretString::from("correct horse"))
            .await
            .unwrap();
        signed_in.expires_at = 0;
        session
            .insert(session_keys::AUTH_SESSION, &signed_in)
            .await
            .unwrap();
        backend.revoke_refresh_tokens();
        let mut changes = store.on_session_change();

        assert!(store.current_session().await.is_none());
        assert_eq!(changes.next().await.unwrap().event, AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation_does_not_sign_in() {
        let (backend, store, _session) = fixture();
        backend.set_require_confirmation(true);
        let outcome = store
            .sign_up("new@techlog.dev", SecretString::from("long enough"))
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired { .. }));
        assert!(store.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_weak_password_is_validation() {
        let (_backend, store, _session) = fixture();
        let err = store
            .sign_up("new@techlog.dev", SecretString::from("123"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let events = AuthEvents::new();
        let subscription = events.subscribe();
        subscription.unsubscribe();
        assert_eq!(events.sender.receiver_count(), 0);
    }
}
