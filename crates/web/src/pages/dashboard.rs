//! Admin dashboard: subscribers and registered users.
//!
//! Both lists are fetched concurrently and joined; the page is `ready` only
//! when both arrive. Either failing puts the whole page in `error`, and retry
//! fetches both again.

use crate::services::{ContentRepository, Viewer};
use crate::supabase::{AdminUserView, Subscriber};

/// Shown when either list cannot be loaded.
pub const DASHBOARD_ERROR: &str = "Failed to load dashboard data. Please try again.";

/// Shown in place of the address for accounts without one.
pub const NO_EMAIL: &str = "(no email)";

/// SQL an operator runs to make an account an admin.
pub const ADMIN_GUIDE_SQL: &str = "UPDATE auth.users\n\
SET raw_app_meta_data = raw_app_meta_data || '{\"role\": \"admin\"}'::jsonb\n\
WHERE email = 'user@example.com';";

/// Where a viewer who may not see the dashboard is sent.
#[must_use]
pub const fn guard_redirect(viewer: &Viewer) -> Option<&'static str> {
    if viewer.is_admin() { None } else { Some("/") }
}

/// Dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DashboardState {
    #[default]
    Loading,
    Ready {
        subscribers: Vec<Subscriber>,
        users: Vec<AdminUserView>,
    },
    Error {
        message: String,
    },
}

/// Fetch both lists.
pub async fn load(repo: &ContentRepository<'_>) -> DashboardState {
    match tokio::try_join!(repo.list_subscribers(), repo.list_admin_users()) {
        Ok((subscribers, users)) => DashboardState::Ready { subscribers, users },
        Err(e) => {
            tracing::error!(error = %e, "Error loading dashboard data");
            DashboardState::Error {
                message: DASHBOARD_ERROR.to_string(),
            }
        }
    }
}

/// One row of either table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRow {
    pub email: String,
    pub role: Option<String>,
    /// e.g. "3/1/2025"
    pub date: String,
}

/// Template-ready dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub subscribers: Vec<DashboardRow>,
    pub users: Vec<DashboardRow>,
    pub error: Option<String>,
}

impl DashboardView {
    #[must_use]
    pub fn from_state(state: &DashboardState) -> Self {
        match state {
            DashboardState::Loading => Self::default(),
            DashboardState::Ready { subscribers, users } => Self {
                subscribers: subscribers
                    .iter()
                    .map(|s| DashboardRow {
                        email: s.email.to_string(),
                        role: None,
                        date: s.created_at.format("%-m/%-d/%Y").to_string(),
                    })
                    .collect(),
                users: users
                    .iter()
                    .map(|u| DashboardRow {
                        email: u.email.clone().unwrap_or_else(|| NO_EMAIL.to_string()),
                        role: Some(u.role.label().to_string()),
                        date: u.created_at.format("%-m/%-d/%Y").to_string(),
                    })
                    .collect(),
                error: None,
            },
            DashboardState::Error { message } => Self {
                error: Some(message.clone()),
                ..Self::default()
            },
        }
    }
}
