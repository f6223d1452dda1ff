//! Configuration and connectivity check.

use techlog_web::config::AppConfig;
use techlog_web::services::ContentRepository;
use techlog_web::supabase::SupabaseClient;
use tracing::info;

/// Load the full configuration and list articles anonymously.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, or the backend
/// does not answer the article listing.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    info!(
        backend = %config.supabase.url,
        listen = %config.socket_addr(),
        seed_policy = ?config.seed_policy,
        secure_cookies = config.is_secure(),
        "Configuration OK"
    );

    let client = SupabaseClient::new(&config.supabase)?;
    let articles = ContentRepository::new(&client, None).list_articles().await?;
    info!(count = articles.len(), "Backend reachable");
    Ok(())
}
