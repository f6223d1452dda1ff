//! Newsletter subscription.

use axum::http::StatusCode;
use techlog_integration_tests::TestApp;
use techlog_web::config::SeedPolicy;

#[tokio::test]
async fn test_invalid_email_is_rejected_and_kept() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let response = app.post_form("/subscribe", "email=not-an-email", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Failed to subscribe. Please try again."));
    assert!(response.body.contains(r#"value="not-an-email""#));
    assert!(app.backend.subscribers().is_empty());
}

#[tokio::test]
async fn test_valid_email_adds_one_subscriber() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let response = app
        .post_form("/subscribe", "email=reader%40example.com", None)
        .await;

    assert!(response.body.contains("Successfully subscribed! Welcome aboard."));
    assert!(response.body.contains(r#"value="""#));
    assert_eq!(app.backend.subscribers().len(), 1);
}

#[tokio::test]
async fn test_duplicate_email_is_an_error() {
    let app = TestApp::new(SeedPolicy::Disabled);
    app.post_form("/subscribe", "email=reader%40example.com", None)
        .await;
    let response = app
        .post_form("/subscribe", "email=reader%40example.com", None)
        .await;

    assert!(response.body.contains("Failed to subscribe"));
    assert_eq!(app.backend.subscribers().len(), 1);
}

#[tokio::test]
async fn test_htmx_gets_form_fragment() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let response = app
        .htmx("POST", "/subscribe", Some("email=reader%40example.com"), None)
        .await;

    assert!(response.body.contains(r#"id="subscribe-form""#));
    assert!(!response.body.contains("<html"));
}

#[tokio::test]
async fn test_subscribe_page() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let response = app.get("/subscribe", None).await;
    assert!(response.body.contains("Join the network. Weekly tech insights delivered."));
    assert!(response.body.contains("No spam. Only weekly tech insights."));
}
