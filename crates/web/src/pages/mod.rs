//! Page controllers.
//!
//! Each page composes the session store, the authorization resolver and the
//! content repository into one workflow and exposes it as a small state
//! machine plus a template-ready view. Route handlers drive them; nothing in
//! here touches HTTP.
//!
//! - [`home`] - article list, seeded on first visit
//! - [`article_card`] - one article and its delete workflow
//! - [`write`] - guarded publishing form
//! - [`subscribe`] - newsletter sign-up
//! - [`login`] - sign in, sign up, password recovery
//! - [`dashboard`] - guarded subscriber and user listing
//! - [`navbar`] - navigation links for the viewer

pub mod article_card;
pub mod dashboard;
pub mod home;
pub mod login;
pub mod navbar;
pub mod subscribe;
pub mod write;

pub use article_card::{ArticleCardView, CardPhase};
pub use dashboard::{DashboardState, DashboardView};
pub use home::{ArticleListView, HomeController, HomeState};
pub use login::{LoginController, LoginState, LoginView};
pub use navbar::Navbar;
pub use subscribe::SubscribeState;
pub use write::{WriteGuard, WriteState};
