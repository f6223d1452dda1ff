//! Business logic services for the blog.
//!
//! # Services
//!
//! - `session` - Per-browser auth session and auth change events
//! - `authz` - Admin status of the current viewer (fail-closed)
//! - `content` - Articles, subscribers and accounts in the backend
//! - `seed` - Example articles for an empty blog

pub mod authz;
pub mod content;
pub mod seed;
pub mod session;

pub use authz::{AuthorizationResolver, Viewer};
pub use content::{ContentError, ContentRepository, SeedReport};
pub use session::{
    AuthEvent, AuthEvents, AuthStateChange, SessionError, SessionStore, SessionSubscription,
    spawn_auth_listener,
};
