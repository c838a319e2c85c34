//! Session endpoint client.
//!
//! Asks the auth layer who is signed in. The response is only used to derive
//! the cart [`OwnerTag`](basket_core::OwnerTag); it is never cached.

use std::future::Future;

use basket_core::SessionInfo;
use reqwest::header::{CACHE_CONTROL, COOKIE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::SessionConfig;

/// Errors that can occur when querying the session endpoint.
#[derive(Debug, Error)]
pub enum SessionError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("Session endpoint returned status {status}")]
    Status { status: u16 },

    /// Body was not a session document.
    #[error("Malformed session response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The configured cookie cannot be sent as a header.
    #[error("Invalid session cookie: {0}")]
    InvalidCookie(String),

    /// No answer within the allotted time.
    #[error("Session query timed out")]
    Timeout,
}

/// Anything that can report the current session.
pub trait SessionSource: Send + Sync {
    /// Fetch the current session.
    fn current_session(&self) -> impl Future<Output = Result<SessionInfo, SessionError>> + Send;
}

/// HTTP client for the session endpoint.
#[derive(Clone)]
pub struct SessionClient {
    client: reqwest::Client,
    endpoint: Url,
    cookie: Option<SecretString>,
}

impl SessionClient {
    /// Create a new session client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the cookie is not a
    /// valid header value.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        if let Some(cookie) = &config.cookie {
            HeaderValue::from_str(cookie.expose_secret())
                .map_err(|e| SessionError::InvalidCookie(e.to_string()))?;
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
            cookie: config.cookie.clone(),
        })
    }

    /// The session endpoint URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl SessionSource for SessionClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn current_session(&self) -> Result<SessionInfo, SessionError> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .header(CACHE_CONTROL, "no-store");
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let session: SessionInfo = serde_json::from_slice(&body)?;
        debug!(authenticated = session.authenticated, "Fetched session");
        Ok(session)
    }
}
