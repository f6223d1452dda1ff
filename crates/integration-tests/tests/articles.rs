//! Home page, seeding, publishing and deleting.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use techlog_integration_tests::{ADMIN_EMAIL, READER_EMAIL, TestApp};
use techlog_web::config::SeedPolicy;

const KAFKA: &str = "Understanding Kafka Partitions and Message Polling";
const GOLANG: &str = "Golang Project Structure and Goroutines: A Practical Guide";

#[tokio::test]
async fn test_anonymous_home_is_empty_and_unseeded() {
    let app = TestApp::new(SeedPolicy::Admin);
    let response = app.get("/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Daily Tech Insights_"));
    assert!(response.body.contains("No articles yet. Be the first to contribute!"));
    assert!(!response.body.contains("Write New Article_"));
    assert_eq!(app.backend.insert_article_calls(), 0);
}

#[tokio::test]
async fn test_admin_home_seeds_once() {
    let app = TestApp::new(SeedPolicy::Admin);
    let cookie = app.sign_in(ADMIN_EMAIL).await;

    let response = app.get("/", Some(&cookie)).await;
    assert!(response.body.contains(KAFKA));
    assert!(response.body.contains(GOLANG));
    assert!(response.body.contains("February 16, 2025"));

    let articles = app.backend.articles();
    assert_eq!(articles.len(), 2);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    assert!(articles.iter().all(|a| a.user_id == admin));
    // Newest first.
    assert_eq!(articles[0].title, GOLANG);

    app.get("/", Some(&cookie)).await;
    assert_eq!(app.backend.insert_article_calls(), 2);
}

#[tokio::test]
async fn test_list_error_offers_retry() {
    let app = TestApp::new(SeedPolicy::Disabled);
    app.backend.set_fail_list_articles(true);

    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Failed to load articles"));
    assert!(response.body.contains("Try Again"));

    app.backend.set_fail_list_articles(false);
    let retry = app.htmx("GET", "/articles", None, None).await;
    assert!(retry.body.contains("No articles yet"));
    assert!(!retry.body.contains("<html"));
}

#[tokio::test]
async fn test_publish_puts_article_first() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    app.backend.insert_article_row("Older", "body", &admin);
    let cookie = app.sign_in(ADMIN_EMAIL).await;

    let response = app
        .post_form("/write", "title=Fresh+entry&content=Learned+things", Some(&cookie))
        .await;
    assert_eq!(response.location(), Some("/"));

    let home = app.get("/", Some(&cookie)).await;
    let fresh = home.body.find("Fresh entry").unwrap();
    let older = home.body.find("Older").unwrap();
    assert!(fresh < older);
}

#[tokio::test]
async fn test_publish_with_empty_title_keeps_input() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let cookie = app.sign_in(ADMIN_EMAIL).await;

    let response = app
        .post_form("/write", "title=++&content=Draft+body", Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Please enter a title."));
    assert!(response.body.contains("Draft body"));
    assert_eq!(app.backend.insert_article_calls(), 0);
}

#[tokio::test]
async fn test_cards_show_delete_only_to_admins() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    let article = app.backend.insert_article_row("Kept", "body", &admin);
    let delete_attr = format!(r#"hx-delete="/articles/{}""#, article.id);

    let reader = app.sign_in(READER_EMAIL).await;
    assert!(!app.get("/", Some(&reader)).await.body.contains(&delete_attr));

    let cookie = app.sign_in(ADMIN_EMAIL).await;
    assert!(app.get("/", Some(&cookie)).await.body.contains(&delete_attr));
}

#[tokio::test]
async fn test_reader_delete_is_forbidden_without_backend_call() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    let article = app.backend.insert_article_row("Kept", "body", &admin);
    let cookie = app.sign_in(READER_EMAIL).await;

    let path = format!("/articles/{}", article.id);
    let response = app.htmx("DELETE", &path, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.backend.delete_calls(), 0);
    assert_eq!(app.backend.articles().len(), 1);
}

#[tokio::test]
async fn test_admin_delete_triggers_reload() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    let article = app.backend.insert_article_row("Doomed", "body", &admin);
    let cookie = app.sign_in(ADMIN_EMAIL).await;

    let path = format!("/articles/{}", article.id);
    let response = app.htmx("DELETE", &path, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
    assert_eq!(
        response.headers.get("HX-Trigger").unwrap(),
        "articles-changed"
    );
    assert!(app.backend.articles().is_empty());

    // The triggered reload re-enters loading and comes back without the card.
    let reload = app.htmx("GET", "/articles", None, Some(&cookie)).await;
    assert!(!reload.body.contains("Doomed"));
    assert!(reload.body.contains("No articles yet"));
}

#[tokio::test]
async fn test_deleting_missing_article_matches_success() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let cookie = app.sign_in(ADMIN_EMAIL).await;

    let response = app
        .htmx("DELETE", "/articles/does-not-exist", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
    assert_eq!(
        response.headers.get("HX-Trigger").unwrap(),
        "articles-changed"
    );
}

#[tokio::test]
async fn test_failed_delete_restores_card_with_message() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    let article = app.backend.insert_article_row("Sticky", "body", &admin);
    let cookie = app.sign_in(ADMIN_EMAIL).await;
    app.backend.set_fail_delete_article(true);

    let path = format!("/articles/{}", article.id);
    let response = app.htmx("DELETE", &path, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Sticky"));
    assert!(response.body.contains("Failed to delete article. Please try again."));
    assert_eq!(app.backend.articles().len(), 1);
}

#[tokio::test]
async fn test_no_script_delete_flow() {
    let app = TestApp::new(SeedPolicy::Disabled);
    let admin = app.backend.session_for(ADMIN_EMAIL).unwrap().user.id;
    let article = app.backend.insert_article_row("Plain", "body", &admin);
    let cookie = app.sign_in(ADMIN_EMAIL).await;
    let path = format!("/articles/{}/delete", article.id);

    let confirm = app.get(&path, Some(&cookie)).await;
    assert!(confirm.body.contains("Are you sure you want to delete this article?"));

    let response = app.post_form(&path, "", Some(&cookie)).await;
    assert_eq!(response.location(), Some("/"));
    assert!(app.backend.articles().is_empty());
}
