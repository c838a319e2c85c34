//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the entry points (the CLI) plus
//! the Sentry helpers used by the cart. Cart operations themselves never
//! fail; these errors come from configuration, storage setup, and input
//! parsing.

use basket_core::PriceError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::SessionError;
use crate::storage::StorageError;
use crate::store::PersistError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Persisted cart could not be read or written.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Session client could not be built or queried.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Price was rejected.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error is the caller's fault rather than the system's.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::Price(_))
    }

    /// Log the error, capturing system errors to Sentry.
    pub fn report(&self) {
        if self.is_user_error() {
            tracing::warn!(error = %self, "Rejected input");
            return;
        }
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Command error"
        );
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Cleared cart for new owner", Some(&[("owner", "user:42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("quantity must be a number".to_string());
        assert_eq!(err.to_string(), "Bad request: quantity must be a number");

        let err = AppError::from(ConfigError::MissingEnvVar("BASKET_SESSION_URL".to_string()));
        assert_eq!(
            err.to_string(),
            "Config error: Missing environment variable: BASKET_SESSION_URL"
        );
    }

    #[test]
    fn test_user_errors() {
        assert!(AppError::BadRequest("x".to_string()).is_user_error());
        assert!(AppError::from(PriceError::Negative(Decimal::NEGATIVE_ONE)).is_user_error());
        assert!(!AppError::Internal("x".to_string()).is_user_error());
        assert!(!AppError::from(StorageError::Poisoned).is_user_error());
    }
}
