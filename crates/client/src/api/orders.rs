//! Customer-facing order endpoints.

use reqwest::Method;
use tracing::instrument;

use clementine_core::{OrderId, RefundRequest, RefundResponseDto};

use crate::error::ApiError;
use crate::transport::Http;

/// `/api/v1/public/orders`.
#[derive(Clone)]
pub struct OrdersApi {
    http: Http,
}

impl OrdersApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    /// File a refund request for a delivered order.
    ///
    /// # Errors
    ///
    /// `404` for an unknown order, `409` when a request already exists;
    /// normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn refund_request(
        &self,
        external_id: &OrderId,
        request: &RefundRequest,
    ) -> Result<RefundResponseDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(
                        Method::POST,
                        &format!("/api/v1/public/orders/{external_id}/refund-request"),
                    )
                    .json(request),
            )
            .await
    }
}
