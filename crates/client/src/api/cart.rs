//! Anonymous cart endpoints.
//!
//! Every cart-scoped call carries the session token in `X-SESSION-ID`; item
//! mutations respond with the full updated cart (server-computed totals).

use reqwest::Method;
use tracing::instrument;

use clementine_core::{
    AddCartItemRequest, CartDto, CartId, CartItemId, SessionId, UpdateCartItemRequest,
};

use crate::error::ApiError;
use crate::transport::Http;

/// `/api/v1/public/cart`.
#[derive(Clone)]
pub struct CartApi {
    http: Http,
}

impl CartApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    /// Create a new anonymous cart; the response seeds the cart session.
    ///
    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<CartDto, ApiError> {
        self.http
            .send(self.http.request(Method::POST, "/api/v1/public/cart"))
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown cart; normalized transport errors otherwise.
    #[instrument(skip(self, session_id))]
    pub async fn get(&self, cart_id: &CartId, session_id: &SessionId) -> Result<CartDto, ApiError> {
        let request = self
            .http
            .request(Method::GET, &format!("/api/v1/public/cart/{cart_id}"));
        self.http.send(Http::with_session(request, session_id)).await
    }

    /// # Errors
    ///
    /// `422` when quantity exceeds stock; normalized transport errors
    /// otherwise.
    #[instrument(skip(self, session_id, request))]
    pub async fn add_item(
        &self,
        cart_id: &CartId,
        session_id: &SessionId,
        request: &AddCartItemRequest,
    ) -> Result<CartDto, ApiError> {
        let builder = self
            .http
            .request(Method::POST, &format!("/api/v1/public/cart/{cart_id}/items"))
            .json(request);
        self.http.send(Http::with_session(builder, session_id)).await
    }

    /// # Errors
    ///
    /// `422` when quantity exceeds stock; normalized transport errors
    /// otherwise.
    #[instrument(skip(self, session_id, request))]
    pub async fn update_item(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
        session_id: &SessionId,
        request: &UpdateCartItemRequest,
    ) -> Result<CartDto, ApiError> {
        let builder = self
            .http
            .request(
                Method::PUT,
                &format!("/api/v1/public/cart/{cart_id}/items/{item_id}"),
            )
            .json(request);
        self.http.send(Http::with_session(builder, session_id)).await
    }

    /// # Errors
    ///
    /// `404` for an unknown item; normalized transport errors otherwise.
    #[instrument(skip(self, session_id))]
    pub async fn remove_item(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
        session_id: &SessionId,
    ) -> Result<CartDto, ApiError> {
        let builder = self.http.request(
            Method::DELETE,
            &format!("/api/v1/public/cart/{cart_id}/items/{item_id}"),
        );
        self.http.send(Http::with_session(builder, session_id)).await
    }
}
