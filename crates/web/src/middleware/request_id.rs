//! Request ID middleware for log correlation.
//!
//! Each request runs inside a `request` span carrying its ID, so every log
//! line a handler or backend call emits can be tied back to one page load.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted as-is.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// Reuse an upstream ID if it is short printable ASCII, else mint one.
fn pick_request_id(upstream: Option<&HeaderValue>) -> String {
    upstream
        .and_then(|h| h.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_UPSTREAM_ID_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that tags the request with an ID and echoes it in the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = pick_request_id(request.headers().get(REQUEST_ID_HEADER));

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
