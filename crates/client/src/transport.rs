//! HTTP transport with uniform error normalization.
//!
//! Every request goes through [`Http`]: the bearer token is read from the
//! session store at send-time, a fixed client-side timeout applies, and any
//! failure - error response, network failure, timeout - surfaces as a
//! normalized [`ApiError`]. No raw `reqwest` error escapes this module.
//!
//! A `401` response has one side effect, executed before the error is
//! returned: the session is cleared (broadcasting the logout cross-tab) and
//! a "session expired" notice is emitted, so every caller observes the
//! logged-out state at the same moment it observes the error.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use clementine_core::{ApiErrorBody, SessionId};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Header carrying the anonymous cart session token.
pub const SESSION_HEADER: &str = "X-SESSION-ID";

const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please log in again.";

struct HttpInner {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
    notifier: Notifier,
}

/// Shared HTTP transport.
#[derive(Clone)]
pub struct Http {
    inner: Arc<HttpInner>,
}

impl Http {
    /// Create the transport.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    #[must_use]
    pub fn new(config: &ClientConfig, session: SessionStore, notifier: Notifier) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(HttpInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                session,
                notifier,
            }),
        }
    }

    /// Start building a request. The bearer token, if any, is attached here
    /// - i.e. at send-time; an anonymous session simply omits the header.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = self.inner.session.bearer_token() {
            request = request.bearer_auth(token.expose_secret());
        }
        request
    }

    /// Attach the cart session token to a request.
    #[must_use]
    pub fn with_session(request: RequestBuilder, session_id: &SessionId) -> RequestBuilder {
        request.header(SESSION_HEADER, session_id.as_str())
    }

    /// Send a request and decode a JSON response body.
    ///
    /// # Errors
    ///
    /// Every failure is a normalized [`ApiError`]; see the module docs for
    /// the 401 side effect.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.dispatch(request).await?;
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            tracing::warn!(error = %err, "failed reading response body");
            ApiError::network()
        })?;
        serde_json::from_str(&body).map_err(|err| {
            tracing::error!(
                error = %err,
                body = %body.chars().take(500).collect::<String>(),
                "unexpected response shape"
            );
            ApiError {
                message: "Invalid response from the server.".to_string(),
                status: status.as_u16(),
                code: None,
            }
        })
    }

    /// Send a request whose success response carries no body (HTTP 204).
    ///
    /// # Errors
    ///
    /// Every failure is a normalized [`ApiError`].
    pub async fn send_no_content(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let _response = self.dispatch(request).await?;
        Ok(())
    }

    /// Execute the request and normalize every failure path.
    async fn dispatch(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                // Offline, DNS, refused connection, or the client timeout:
                // the server was never reached.
                tracing::warn!(error = %err, "network failure");
                return Err(ApiError::network());
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(self.normalize_error(status, response).await)
    }

    async fn normalize_error(&self, status: StatusCode, response: reqwest::Response) -> ApiError {
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
        let error = ApiError::from_response(status.as_u16(), parsed);

        tracing::warn!(
            status = status.as_u16(),
            code = error.code.as_deref().unwrap_or(""),
            "request failed: {}",
            error.message
        );

        if error.is_unauthorized() {
            // Forced logout happens before the caller sees the rejection, so
            // the logged-out state and the error are observed together.
            self.inner.session.logout();
            self.inner.notifier.error(SESSION_EXPIRED_NOTICE);
        }
        error
    }
}
