//! Subscribe page: visitors join the mailing list.
//!
//! The button is disabled while the request is in flight; the server renders
//! the idle form or the result.

use crate::services::{ContentError, ContentRepository};

pub const SUBSCRIBE_SUCCESS: &str = "Successfully subscribed! Welcome aboard.";
pub const SUBSCRIBE_ERROR: &str = "Failed to subscribe. Please try again.";

/// Subscribe form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeState {
    Idle,
    /// Subscribed; the input is cleared.
    Success,
    /// Not subscribed; the input is kept for another try.
    Error { email: String, message: String },
}

impl SubscribeState {
    /// Value of the email input.
    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Error { email, .. } => email,
            Self::Idle | Self::Success => "",
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => Some(SUBSCRIBE_SUCCESS),
            Self::Error { message, .. } => Some(message),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Submit the form.
pub async fn submit(repo: &ContentRepository<'_>, email: String) -> SubscribeState {
    match repo.create_subscriber(&email).await {
        Ok(_) => SubscribeState::Success,
        Err(e) => {
            match &e {
                ContentError::Validation(reason) => {
                    tracing::info!(reason = %reason, "Subscription rejected");
                }
                _ => tracing::error!(error = %e, "Error subscribing"),
            }
            SubscribeState::Error {
                email,
                message: SUBSCRIBE_ERROR.to_string(),
            }
        }
    }
}
