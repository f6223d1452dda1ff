//! TechLog CLI - operator tools for the blog's backend.
//!
//! # Usage
//!
//! ```bash
//! # Insert the example articles as an admin account (only into an empty blog)
//! techlog seed articles -e admin@example.com -p 'password'
//!
//! # Insert them even if articles exist
//! techlog seed articles -e admin@example.com --force
//!
//! # Verify configuration and that the backend answers
//! techlog check
//! ```
//!
//! # Commands
//!
//! - `seed articles` - Insert the example articles
//! - `check` - Configuration and connectivity check

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "techlog")]
#[command(author, version, about = "TechLog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the backend with example content
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Check configuration and backend connectivity
    Check,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the example articles, signed in as an admin account
    Articles {
        /// Admin account email
        #[arg(short, long, env = "TECHLOG_SEED_EMAIL")]
        email: String,

        /// Admin account password
        #[arg(short, long, env = "TECHLOG_SEED_PASSWORD", hide_env_values = true)]
        password: String,

        /// Insert even when the blog already has articles
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { target } => match target {
            SeedTarget::Articles {
                email,
                password,
                force,
            } => commands::seed::articles(&email, password.into(), force).await?,
        },
        Commands::Check => commands::check::run().await?,
    }
    Ok(())
}
