//! Authentication endpoints.

use reqwest::Method;
use tracing::instrument;

use clementine_core::{AuthResponse, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::transport::Http;

/// `POST /api/v1/auth/*`.
#[derive(Clone)]
pub struct AuthApi {
    http: Http,
}

impl AuthApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// `401` for bad credentials; normalized transport errors otherwise.
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::POST, "/api/v1/auth/login")
                    .json(request),
            )
            .await
    }

    /// Create an account; responds like a successful login.
    ///
    /// # Errors
    ///
    /// `409` when the email is already registered; normalized transport
    /// errors otherwise.
    #[instrument(skip_all)]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::POST, "/api/v1/auth/register")
                    .json(request),
            )
            .await
    }
}
