//! Integration tests for Basket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p basket-integration-tests
//! ```
//!
//! No external services are needed: [`MockSession`] serves the session
//! endpoint from an in-process axum server bound to a random local port.
//!
//! # Test Categories
//!
//! - `session_client` - HTTP session client against the mock endpoint
//! - `ownership` - Ownership check and startup ordering over on-disk storage

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use basket_core::SessionInfo;
use basket_storefront::config::SessionConfig;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use url::Url;

/// Path the mock serves the session document on.
pub const SESSION_PATH: &str = "/api/auth/session";

/// What the mock answers with.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: String,
    delay: Duration,
}

impl Reply {
    /// A 200 answer carrying `session`.
    #[must_use]
    pub fn session(session: &SessionInfo) -> Self {
        Self::body(serde_json::to_string(session).unwrap_or_default())
    }

    /// A 200 answer with an arbitrary body.
    #[must_use]
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// An empty answer with `status`.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the answer back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Headers of a request the mock received.
#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub cookie: Option<String>,
    pub cache_control: Option<String>,
}

struct Shared {
    reply: Mutex<Reply>,
    seen: Mutex<Vec<SeenRequest>>,
}

/// In-process session endpoint.
///
/// The server task is aborted on drop.
pub struct MockSession {
    url: Url,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl MockSession {
    /// Bind to a random local port and start answering with `reply`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(reply: Reply) -> io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let url = Url::parse(&format!("http://{addr}{SESSION_PATH}")).map_err(io::Error::other)?;

        let shared = Arc::new(Shared {
            reply: Mutex::new(reply),
            seen: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route(SESSION_PATH, get(session_handler))
            .with_state(shared.clone());

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url,
            shared,
            server,
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Client configuration pointing at this endpoint.
    #[must_use]
    pub fn config(&self, cookie: Option<&str>, timeout: Duration) -> SessionConfig {
        SessionConfig {
            url: self.url.clone(),
            cookie: cookie.map(SecretString::from),
            timeout,
        }
    }

    /// Change the answer for subsequent requests.
    pub fn set_reply(&self, reply: Reply) {
        *self
            .shared
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = reply;
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.shared
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn session_handler(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> impl IntoResponse {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    shared
        .seen
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(SeenRequest {
            cookie: header_text(header::COOKIE),
            cache_control: header_text(header::CACHE_CONTROL),
        });

    let reply = shared
        .reply
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
}
