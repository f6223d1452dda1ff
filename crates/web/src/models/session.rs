//! Session-related types.
//!
//! Keys under which per-browser state is kept in the cookie session.

/// Session keys for authentication data.
pub mod keys {
    /// Key for the cached auth session (tokens plus user).
    pub const AUTH_SESSION: &str = "auth_session";
}
