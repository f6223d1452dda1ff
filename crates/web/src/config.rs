//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Base URL of the hosted backend project (e.g., `https://abc.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public (anon) API key of the project
//!
//! ## Optional
//! - `TECHLOG_HOST` - Bind address (default: 127.0.0.1)
//! - `TECHLOG_PORT` - Listen port (default: 3000)
//! - `TECHLOG_BASE_URL` - Public URL of the blog (default: `http://localhost:3000`)
//! - `TECHLOG_SEED_POLICY` - Who may trigger example seeding: `disabled`, `signed_in`, `admin` (default: admin)
//! - `TECHLOG_SIGN_IN_DELAY_MS` - Pause on the "signed in" screen before redirecting (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Who is allowed to trigger seeding of the example articles when the
/// article table is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Never seed automatically.
    Disabled,
    /// Any signed-in reader seeds (and becomes the author of record).
    SignedIn,
    /// Only an admin seeds.
    #[default]
    Admin,
}

impl FromStr for SeedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            "signed_in" | "signed-in" | "any" => Ok(Self::SignedIn),
            "admin" => Ok(Self::Admin),
            other => Err(format!(
                "unknown seed policy '{other}' (expected disabled, signed_in or admin)"
            )),
        }
    }
}

/// Blog application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the blog
    pub base_url: String,
    /// Hosted backend connection settings
    pub supabase: SupabaseConfig,
    /// Automatic seeding of example articles
    pub seed_policy: SeedPolicy,
    /// Pause shown after a successful sign-in
    pub sign_in_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Hosted backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project base URL; `/auth/v1` and `/rest/v1` are resolved against it
    pub url: Url,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend URL or key is missing or invalid,
    /// or if an optional variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let supabase = SupabaseConfig::from_env()?;
        let host = parse_env_or_default::<IpAddr>("TECHLOG_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("TECHLOG_PORT", "3000")?;
        let base_url = get_env_or_default("TECHLOG_BASE_URL", "http://localhost:3000");
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TECHLOG_BASE_URL".to_string(), e.to_string())
        })?;
        let seed_policy = get_env_or_default("TECHLOG_SEED_POLICY", "admin")
            .parse::<SeedPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("TECHLOG_SEED_POLICY".to_string(), e))?;
        let sign_in_delay =
            Duration::from_millis(parse_env_or_default::<u64>("TECHLOG_SIGN_IN_DELAY_MS", "1000")?);

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            supabase,
            seed_policy,
            sign_in_delay,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the blog is served over HTTPS (controls secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SupabaseConfig {
    /// Load the backend settings on their own.
    ///
    /// Used by the CLI, which needs the backend but not the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if either variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("SUPABASE_URL")?;
        let url = parse_backend_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e))?;
        let anon_key = get_validated_secret("SUPABASE_ANON_KEY")?;
        Ok(Self { url, anon_key })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize the backend base URL.
///
/// The URL must be absolute http(s); a trailing slash is added so relative
/// paths like `rest/v1/articles` resolve beneath it.
fn parse_backend_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("URL must have a host".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable (empty counts as missing).
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Key length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a key is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the project's API settings."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a key from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(value.trim(), key)?;
    Ok(SecretString::from(value.trim().to_string()))
}

/// Expose the anon key for request headers.
pub(crate) fn anon_key(config: &SupabaseConfig) -> &str {
    config.anon_key.expose_secret()
}
