//! Seed the backend with the example articles.
//!
//! Signs in with an admin account so the inserts pass the backend's access
//! rules, then writes each example article with its original publication
//! date.

use secrecy::SecretString;
use techlog_core::Email;
use techlog_web::config::SupabaseConfig;
use techlog_web::services::ContentRepository;
use techlog_web::supabase::{AuthBackend, SupabaseClient};
use tracing::{info, warn};

/// Insert the example articles as the given account.
///
/// Without `force`, nothing is inserted when articles already exist.
///
/// # Errors
///
/// Returns an error if configuration is missing, the sign-in fails, the
/// account is not allowed to write, or no article could be inserted.
pub async fn articles(
    email: &str,
    password: SecretString,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = SupabaseConfig::from_env()?;
    let client = SupabaseClient::new(&config)?;
    info!(backend = %config.url, "Backend client created");

    let email = Email::parse_input(email)?;
    let session = client.sign_in_with_password(&email, &password).await?;
    info!(user_id = %session.user.id, "Signed in");

    let repo = ContentRepository::new(&client, Some(session.access_token.as_str()));

    if !force {
        let existing = repo.list_articles().await?;
        if !existing.is_empty() {
            info!(
                count = existing.len(),
                "Articles already exist, nothing to do (use --force to insert anyway)"
            );
            return Ok(());
        }
    }

    let report = repo.seed_examples(&session.user.id).await;
    info!(
        inserted = report.inserted,
        failed = report.failed,
        "Seeding complete"
    );

    if let Err(e) = client.sign_out(&session.access_token).await {
        warn!(error = %e, "Sign-out after seeding failed");
    }

    if report.inserted == 0 {
        return Err("no articles were inserted; is the account an admin?".into());
    }
    Ok(())
}

