//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `POOJABDI_BASE_URL` - Shop origin serving `/products.json` and `/api/cart`
//!   (default: <http://127.0.0.1:5000>)
//! - `POOJABDI_ADMIN_URL` - Admin API origin (default: `POOJABDI_BASE_URL`)
//! - `POOJABDI_CART_FILE` - Local key-value storage file for the local cart
//!   (default: `.poojabdi/storage.json`)
//! - `POOJABDI_HTTP_TIMEOUT_SECS` - Request timeout in seconds, `0` disables
//!   (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_STORAGE_FILE: &str = ".poojabdi/storage.json";
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shop origin
    pub base_url: Url,
    /// Admin API origin
    pub admin_url: Url,
    /// File backing the local key-value store
    pub storage_path: PathBuf,
    /// Transport timeout; `None` waits indefinitely
    pub http_timeout: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable URLs or timeouts.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_url(
            "POOJABDI_BASE_URL",
            &lookup("POOJABDI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;
        let admin_url = match lookup("POOJABDI_ADMIN_URL") {
            Some(raw) => parse_url("POOJABDI_ADMIN_URL", &raw)?,
            None => base_url.clone(),
        };
        let storage_path = PathBuf::from(
            lookup("POOJABDI_CART_FILE").unwrap_or_else(|| DEFAULT_STORAGE_FILE.to_string()),
        );
        let timeout_secs = lookup("POOJABDI_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .trim()
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("POOJABDI_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        let http_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(Self {
            base_url,
            admin_url,
            storage_path,
            http_timeout,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.trim().is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Replace the shop origin, and the admin origin when it followed it.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        if self.admin_url == self.base_url {
            self.admin_url = base_url.clone();
        }
        self.base_url = base_url;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a URL variable.
///
/// Origins are normalized to end in `/` so relative joins keep any path prefix.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
