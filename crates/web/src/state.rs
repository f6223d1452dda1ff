//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::config::AppConfig;
use crate::services::{AuthEvents, AuthorizationResolver, SessionStore};
use crate::supabase::{AuthBackend, BackendError, DataBackend, SupabaseClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and holds the backend client
/// and configuration. Nothing per-browser lives here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    auth: Arc<dyn AuthBackend>,
    data: Arc<dyn DataBackend>,
    authz: AuthorizationResolver,
    events: AuthEvents,
}

impl AppState {
    /// Create the state with the HTTP backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn from_config(config: AppConfig) -> Result<Self, BackendError> {
        let client = Arc::new(SupabaseClient::new(&config.supabase)?);
        Ok(Self::new(config, client.clone(), client))
    }

    /// Create the state from explicit backends.
    #[must_use]
    pub fn new(config: AppConfig, auth: Arc<dyn AuthBackend>, data: Arc<dyn DataBackend>) -> Self {
        let authz = AuthorizationResolver::new(data.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                data,
                authz,
                events: AuthEvents::new(),
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the row and procedure backend.
    #[must_use]
    pub fn data(&self) -> &dyn DataBackend {
        self.inner.data.as_ref()
    }

    /// Get the admin status resolver.
    #[must_use]
    pub fn authz(&self) -> &AuthorizationResolver {
        &self.inner.authz
    }

    /// Get the application-wide auth change channel.
    #[must_use]
    pub fn events(&self) -> &AuthEvents {
        &self.inner.events
    }

    /// Build the session store of one browser.
    #[must_use]
    pub fn session_store(&self, session: Session) -> SessionStore {
        SessionStore::new(self.inner.auth.clone(), session, self.inner.events.clone())
    }
}
