//! Admin console endpoints. All of these require an `ADMIN` bearer token.

use reqwest::Method;
use tracing::instrument;

use clementine_core::{
    AdminCreateCategoryRequest, AdminCreateProductRequest, AdminListCustomersParams,
    AdminListOrdersParams, AdminListProductsParams, AdminUpdateCategoryRequest,
    AdminUpdateOrderStatusRequest, AdminUpdateProductRequest, CategoryDto, CategoryId,
    CustomerDto, CustomerId, OrderDto, OrderId, Page, ProductDto, ProductId,
};

use crate::error::ApiError;
use crate::transport::Http;

/// `/api/v1/admin/*`.
#[derive(Clone)]
pub struct AdminApi {
    http: Http,
}

impl AdminApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryDto>, ApiError> {
        self.http
            .send(self.http.request(Method::GET, "/api/v1/admin/categories"))
            .await
    }

    /// # Errors
    ///
    /// `409` for a duplicate slug; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn create_category(
        &self,
        request: &AdminCreateCategoryRequest,
    ) -> Result<CategoryDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::POST, "/api/v1/admin/categories")
                    .json(request),
            )
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown category; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: &CategoryId,
        request: &AdminUpdateCategoryRequest,
    ) -> Result<CategoryDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::PUT, &format!("/api/v1/admin/categories/{id}"))
                    .json(request),
            )
            .await
    }

    /// Delete a category. Succeeds with `204 No Content`.
    ///
    /// # Errors
    ///
    /// `409` (`CATEGORY_IN_USE`) while products are still assigned to it;
    /// normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), ApiError> {
        self.http
            .send_no_content(
                self.http
                    .request(Method::DELETE, &format!("/api/v1/admin/categories/{id}")),
            )
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        params: &AdminListProductsParams,
    ) -> Result<Page<ProductDto>, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, "/api/v1/admin/products")
                    .query(params),
            )
            .await
    }

    /// # Errors
    ///
    /// `409` for a duplicate slug; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        request: &AdminCreateProductRequest,
    ) -> Result<ProductDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::POST, "/api/v1/admin/products")
                    .json(request),
            )
            .await
    }

    /// Partial update, including stock adjustments.
    ///
    /// # Errors
    ///
    /// `404` for an unknown product; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        request: &AdminUpdateProductRequest,
    ) -> Result<ProductDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::PUT, &format!("/api/v1/admin/products/{id}"))
                    .json(request),
            )
            .await
    }

    /// Delete a product. Succeeds with `204 No Content`.
    ///
    /// # Errors
    ///
    /// `404` for an unknown product; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.http
            .send_no_content(
                self.http
                    .request(Method::DELETE, &format!("/api/v1/admin/products/{id}")),
            )
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        params: &AdminListOrdersParams,
    ) -> Result<Page<OrderDto>, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, "/api/v1/admin/orders")
                    .query(params),
            )
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown order; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn get_order(&self, external_id: &OrderId) -> Result<OrderDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, &format!("/api/v1/admin/orders/{external_id}")),
            )
            .await
    }

    /// # Errors
    ///
    /// `409` for an illegal status transition; normalized transport errors
    /// otherwise.
    #[instrument(skip(self, request))]
    pub async fn update_order_status(
        &self,
        external_id: &OrderId,
        request: &AdminUpdateOrderStatusRequest,
    ) -> Result<OrderDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(
                        Method::PUT,
                        &format!("/api/v1/admin/orders/{external_id}/status"),
                    )
                    .json(request),
            )
            .await
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        params: &AdminListCustomersParams,
    ) -> Result<Page<CustomerDto>, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, "/api/v1/admin/customers")
                    .query(params),
            )
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown customer; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: &CustomerId) -> Result<CustomerDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, &format!("/api/v1/admin/customers/{id}")),
            )
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown customer; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn enable_customer(&self, id: &CustomerId) -> Result<CustomerDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::PUT, &format!("/api/v1/admin/customers/{id}/enable")),
            )
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown customer; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn disable_customer(&self, id: &CustomerId) -> Result<CustomerDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::PUT, &format!("/api/v1/admin/customers/{id}/disable")),
            )
            .await
    }
}
