//! View-independent models kept in the browser session.

pub mod session;

pub use session::keys as session_keys;
