//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BASKET_SESSION_URL` - Session endpoint returning `{authenticated, userId, role}`
//!
//! ## Optional
//! - `BASKET_STORAGE_DIR` - Directory for durable cart storage (default: .basket)
//! - `BASKET_SESSION_COOKIE` - Auth cookie forwarded to the session endpoint
//! - `BASKET_SESSION_TIMEOUT_MS` - Session request timeout (default: 3000)
//! - `BASKET_HYDRATION_WAIT_MS` - Wait for the ownership check before showing
//!   the persisted cart (default: 250)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".basket";
const DEFAULT_SESSION_TIMEOUT_MS: &str = "3000";
const DEFAULT_HYDRATION_WAIT_MS: &str = "250";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront cart configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory holding the durable cart and owner records
    pub storage_dir: PathBuf,
    /// Session endpoint configuration
    pub session: SessionConfig,
    /// How long startup waits for the ownership check before restoring
    pub hydration_wait: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Session endpoint configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session endpoint URL
    pub url: Url,
    /// Auth cookie sent along with the query
    pub cookie: Option<SecretString>,
    /// Request timeout; expiry counts as a failed check
    pub timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let storage_dir = PathBuf::from(env.or_default("BASKET_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let session = SessionConfig::from_env(&env)?;
        let hydration_wait = env.millis("BASKET_HYDRATION_WAIT_MS", DEFAULT_HYDRATION_WAIT_MS)?;

        Ok(Self {
            storage_dir,
            session,
            hydration_wait,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

impl SessionConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let raw_url = env.required("BASKET_SESSION_URL")?;
        let url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BASKET_SESSION_URL".to_string(), e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "BASKET_SESSION_URL".to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        Ok(Self {
            url,
            cookie: env.optional("BASKET_SESSION_COOKIE").map(SecretString::from),
            timeout: env.millis("BASKET_SESSION_TIMEOUT_MS", DEFAULT_SESSION_TIMEOUT_MS)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup with the usual required/optional/default helpers.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a millisecond duration with a default value.
    fn millis(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        self.or_default(key, default)
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}
