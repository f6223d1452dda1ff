//! HTTP middleware stack for the blog.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, per-request hub)
//! 2. Request ID (span per request, `x-request-id` echoed)
//! 3. `TraceLayer` (request logging)
//! 4. Session layer (tower-sessions with the memory store)
//!
//! The [`CurrentViewer`] extractor runs inside handlers, after all layers.

pub mod request_id;
pub mod session;
pub mod viewer;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
pub use viewer::CurrentViewer;
