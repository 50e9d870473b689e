//! Checkout endpoint.

use reqwest::Method;
use tracing::instrument;

use clementine_core::{CreateOrderRequest, OrderDto};

use crate::error::ApiError;
use crate::transport::Http;

/// `POST /api/v1/checkout/create-order`.
#[derive(Clone)]
pub struct CheckoutApi {
    http: Http,
}

impl CheckoutApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    /// Place the order, consuming the server-side cart.
    ///
    /// # Errors
    ///
    /// `409` for stock conflicts discovered at checkout; normalized
    /// transport errors otherwise.
    #[instrument(skip_all)]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::POST, "/api/v1/checkout/create-order")
                    .json(request),
            )
            .await
    }
}
