//! Login page: sign in, sign up and password recovery.
//!
//! After a `SIGNED_IN` event the page switches to a short "signing in"
//! interstitial and then sends the browser home.

use std::time::Duration;

use secrecy::SecretString;

use crate::services::{AuthEvent, AuthStateChange, SessionStore};
use crate::supabase::SignUpOutcome;

pub const CONFIRM_EMAIL_NOTICE: &str = "Check your email for the confirmation link.";
pub const RECOVERY_NOTICE: &str = "Check your email for the password reset link.";

/// Which form of the auth widget is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginView {
    #[default]
    SignIn,
    SignUp,
    ForgottenPassword,
}

impl LoginView {
    /// Parse the `view` query parameter; unknown values show sign-in.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("sign_up") => Self::SignUp,
            Some("forgotten_password") => Self::ForgottenPassword,
            _ => Self::SignIn,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::ForgottenPassword => "forgotten_password",
        }
    }
}

/// Login page state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Form {
        view: LoginView,
        error: Option<String>,
        notice: Option<String>,
        email: String,
    },
    /// Signed in; show the interstitial for `delay`, then go to `redirect_to`.
    SigningIn {
        redirect_to: &'static str,
        delay: Duration,
    },
}

impl LoginState {
    #[must_use]
    pub const fn form(view: LoginView) -> Self {
        Self::Form {
            view,
            error: None,
            notice: None,
            email: String::new(),
        }
    }
}

/// Drives the login page for one browser.
pub struct LoginController<'a> {
    store: &'a SessionStore,
    delay: Duration,
}

impl<'a> LoginController<'a> {
    #[must_use]
    pub const fn new(store: &'a SessionStore, delay: Duration) -> Self {
        Self { store, delay }
    }

    /// React to an auth state change. Only `SIGNED_IN` moves the page.
    #[must_use]
    pub const fn on_auth_change(&self, change: &AuthStateChange) -> Option<LoginState> {
        match change.event {
            AuthEvent::SignedIn => Some(LoginState::SigningIn {
                redirect_to: "/",
                delay: self.delay,
            }),
            AuthEvent::SignedOut | AuthEvent::TokenRefreshed | AuthEvent::UserUpdated => None,
        }
    }

    /// Submit the sign-in form.
    pub async fn sign_in(&self, email: String, password: SecretString) -> LoginState {
        match self.store.sign_in(&email, password).await {
            Ok(session) => self.signed_in(session),
            Err(e) => {
                tracing::info!(error = %e, "Sign-in failed");
                LoginState::Form {
                    view: LoginView::SignIn,
                    error: Some(e.user_message()),
                    notice: None,
                    email,
                }
            }
        }
    }

    /// Submit the sign-up form.
    pub async fn sign_up(&self, email: String, password: SecretString) -> LoginState {
        match self.store.sign_up(&email, password).await {
            Ok(SignUpOutcome::SignedIn(session)) => self.signed_in(session),
            Ok(SignUpOutcome::ConfirmationRequired { email }) => LoginState::Form {
                view: LoginView::SignIn,
                error: None,
                notice: Some(CONFIRM_EMAIL_NOTICE.to_string()),
                email: email.into_inner(),
            },
            Err(e) => {
                tracing::info!(error = %e, "Sign-up failed");
                LoginState::Form {
                    view: LoginView::SignUp,
                    error: Some(e.user_message()),
                    notice: None,
                    email,
                }
            }
        }
    }

    /// Submit the forgotten-password form.
    pub async fn recover(&self, email: String, redirect_to: &str) -> LoginState {
        match self.store.request_password_reset(&email, redirect_to).await {
            Ok(()) => LoginState::Form {
                view: LoginView::SignIn,
                error: None,
                notice: Some(RECOVERY_NOTICE.to_string()),
                email,
            },
            Err(e) => {
                tracing::info!(error = %e, "Password recovery failed");
                LoginState::Form {
                    view: LoginView::ForgottenPassword,
                    error: Some(e.user_message()),
                    notice: None,
                    email,
                }
            }
        }
    }

    // The sign-in POST is this page's event source. `SessionStore` has
    // already published the same `SIGNED_IN` on the app-wide channel, which
    // also carries every other browser's changes, so the page does not read
    // it back from there.
    fn signed_in(&self, session: crate::supabase::AuthSession) -> LoginState {
        let change = AuthStateChange {
            event: AuthEvent::SignedIn,
            session: Some(session),
        };
        self.on_auth_change(&change)
            .unwrap_or_else(|| LoginState::form(LoginView::SignIn))
    }
}
