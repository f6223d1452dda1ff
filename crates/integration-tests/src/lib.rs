//! Integration tests for TechLog.
//!
//! The full router is driven in-process with `tower::ServiceExt::oneshot`
//! against the in-memory backend, so the tests need no network and no
//! hosted project.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p techlog-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - sign in, sign out, guards
//! - `articles` - home page, seeding, publishing, deleting
//! - `subscribe` - newsletter form
//! - `dashboard` - admin dashboard

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use secrecy::SecretString;
use techlog_core::Role;
use techlog_web::config::{AppConfig, SeedPolicy, SupabaseConfig};
use techlog_web::middleware::SESSION_COOKIE_NAME;
use techlog_web::routes;
use techlog_web::state::AppState;
use techlog_web::supabase::fake::InMemoryBackend;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@techlog.dev";
pub const READER_EMAIL: &str = "reader@techlog.dev";
pub const PASSWORD: &str = "correct horse battery";

/// Configuration pointing at a backend that is never contacted.
#[must_use]
pub fn test_config(seed_policy: SeedPolicy) -> AppConfig {
    AppConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        supabase: SupabaseConfig {
            url: url::Url::parse("http://backend.invalid/").unwrap(),
            anon_key: SecretString::from("test-anon-key-not-used"),
        },
        seed_policy,
        sign_in_delay: Duration::from_millis(1000),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A response with its body read.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Session cookie (`name=value`) set by this response, if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| v.starts_with(SESSION_COOKIE_NAME))
            .find_map(|v| v.split(';').next().map(str::to_string))
    }
}

/// The application over an in-memory backend with one admin and one reader.
pub struct TestApp {
    pub backend: Arc<InMemoryBackend>,
    router: Router,
}

impl TestApp {
    #[must_use]
    pub fn new(seed_policy: SeedPolicy) -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_user(ADMIN_EMAIL, PASSWORD, Role::Admin);
        backend.add_user(READER_EMAIL, PASSWORD, Role::None);
        let state = AppState::new(test_config(seed_policy), backend.clone(), backend.clone());
        Self {
            backend,
            router: routes::app(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.send(build(path, "GET", cookie, None, false)).await
    }

    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        self.send(build(path, "POST", cookie, Some(form), false)).await
    }

    /// A request as HTMX sends it.
    pub async fn htmx(
        &self,
        method: &str,
        path: &str,
        form: Option<&str>,
        cookie: Option<&str>,
    ) -> TestResponse {
        self.send(build(path, method, cookie, form, true)).await
    }

    /// Sign in through the login form and return the session cookie.
    pub async fn sign_in(&self, email: &str) -> String {
        let form = format!("email={}&password={}", encode(email), encode(PASSWORD));
        let response = self.post_form("/login", &form, None).await;
        assert_eq!(response.status, StatusCode::OK);
        response
            .session_cookie()
            .expect("sign-in should set a session cookie")
    }
}

fn build(
    path: &str,
    method: &str,
    cookie: Option<&str>,
    form: Option<&str>,
    htmx: bool,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Form-encode a value.
#[must_use]
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
