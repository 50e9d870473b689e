//! Admin console service: categories, products, orders, customers, uploads.
//!
//! Reads are cached like storefront reads; mutations are not optimistic -
//! they invalidate the affected entity kinds on success so the next read
//! refetches. Product and category edits also invalidate the public
//! storefront records of the same entity, since an admin edit changes what
//! shoppers see.

use std::time::Duration;

use tracing::instrument;

use clementine_core::{
    AdminCreateCategoryRequest, AdminCreateProductRequest, AdminListCustomersParams,
    AdminListOrdersParams, AdminListProductsParams, AdminUpdateCategoryRequest,
    AdminUpdateOrderStatusRequest, AdminUpdateProductRequest, CategoryDto, CategoryId,
    ContentUploadResponse, CustomerDto, CustomerId, OrderDto, OrderId, OrderStatus, Page,
    ProductDto, ProductId,
};

use crate::api::{AdminApi, ContentApi};
use crate::cache::{CacheKey, CacheValue, EntityKind};
use crate::context::Context;
use crate::error::{ClientError, user_message};

/// Admin lists sit behind back-office screens that refresh often.
const LIST_STALENESS: Duration = Duration::from_secs(30);
/// The category tree changes rarely.
const CATEGORY_STALENESS: Duration = Duration::from_secs(60);

const CATEGORY_IN_USE_NOTICE: &str = "Cannot delete: category still has products assigned to it.";

/// Back-office surface of the SDK. Requires an `ADMIN` session.
#[derive(Clone)]
pub struct Admin {
    ctx: Context,
    api: AdminApi,
    content: ContentApi,
}

impl Admin {
    #[must_use]
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            api: ctx.admin_api(),
            content: ctx.content_api(),
            ctx,
        }
    }

    fn surface(&self, error: ClientError) -> ClientError {
        self.ctx.notifier().error(user_message(&error));
        error
    }

    fn invalidate_categories(&self) {
        self.ctx.cache().invalidate(EntityKind::AdminCategories);
        self.ctx.cache().invalidate(EntityKind::Categories);
    }

    fn invalidate_products(&self) {
        self.ctx.cache().invalidate(EntityKind::AdminProducts);
        self.ctx.cache().invalidate(EntityKind::Products);
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryDto>, ClientError> {
        let api = self.api.clone();
        let value = self
            .ctx
            .cache()
            .fetch(CacheKey::AdminCategories, CATEGORY_STALENESS, move || {
                let api = api.clone();
                async move {
                    api.list_categories()
                        .await
                        .map(CacheValue::AdminCategories)
                }
            })
            .await?;
        Ok(value
            .into_categories()
            .expect("admin categories key holds category lists"))
    }

    /// # Errors
    ///
    /// `409` for a duplicate slug; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn create_category(
        &self,
        request: &AdminCreateCategoryRequest,
    ) -> Result<CategoryDto, ClientError> {
        match self.api.create_category(request).await {
            Ok(category) => {
                self.invalidate_categories();
                self.ctx.notifier().success("Category created.");
                Ok(category)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// # Errors
    ///
    /// `404` for an unknown category; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: &CategoryId,
        request: &AdminUpdateCategoryRequest,
    ) -> Result<CategoryDto, ClientError> {
        match self.api.update_category(id, request).await {
            Ok(category) => {
                self.invalidate_categories();
                self.ctx.notifier().success("Category updated.");
                Ok(category)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// Delete a category. A `409` conflict (products still assigned) gets
    /// its own dedicated notice instead of the generic mapping.
    ///
    /// # Errors
    ///
    /// `409` while products reference the category; normalized transport
    /// errors otherwise.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), ClientError> {
        match self.api.delete_category(id).await {
            Ok(()) => {
                self.invalidate_categories();
                self.ctx.notifier().success("Category deleted.");
                Ok(())
            }
            Err(error) => {
                let error = ClientError::from(error);
                if error.status() == Some(409) {
                    self.ctx.notifier().error(CATEGORY_IN_USE_NOTICE);
                    Err(error)
                } else {
                    Err(self.surface(error))
                }
            }
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        params: &AdminListProductsParams,
    ) -> Result<Page<ProductDto>, ClientError> {
        let api = self.api.clone();
        let params_owned = params.clone();
        let value = self
            .ctx
            .cache()
            .fetch(CacheKey::admin_products(params), LIST_STALENESS, move || {
                let api = api.clone();
                let params = params_owned.clone();
                async move {
                    api.list_products(&params)
                        .await
                        .map(CacheValue::AdminProducts)
                }
            })
            .await?;
        Ok(value
            .into_products()
            .expect("admin products key holds product pages"))
    }

    /// # Errors
    ///
    /// `409` for a duplicate slug; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        request: &AdminCreateProductRequest,
    ) -> Result<ProductDto, ClientError> {
        match self.api.create_product(request).await {
            Ok(product) => {
                self.invalidate_products();
                self.ctx.notifier().success("Product created successfully.");
                Ok(product)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// # Errors
    ///
    /// `404` for an unknown product; normalized transport errors otherwise.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        request: &AdminUpdateProductRequest,
    ) -> Result<ProductDto, ClientError> {
        match self.api.update_product(id, request).await {
            Ok(product) => {
                self.invalidate_products();
                self.ctx.notifier().success("Product updated successfully.");
                Ok(product)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// # Errors
    ///
    /// `404` for an unknown product; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ClientError> {
        match self.api.delete_product(id).await {
            Ok(()) => {
                self.invalidate_products();
                self.ctx.notifier().success("Product deleted.");
                Ok(())
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn orders(
        &self,
        params: &AdminListOrdersParams,
    ) -> Result<Page<OrderDto>, ClientError> {
        let api = self.api.clone();
        let params_owned = params.clone();
        let value = self
            .ctx
            .cache()
            .fetch(CacheKey::admin_orders(params), LIST_STALENESS, move || {
                let api = api.clone();
                let params = params_owned.clone();
                async move { api.list_orders(&params).await.map(CacheValue::AdminOrders) }
            })
            .await?;
        Ok(value.into_orders().expect("admin orders key holds order pages"))
    }

    /// # Errors
    ///
    /// `404` for an unknown order; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn order(&self, external_id: &OrderId) -> Result<OrderDto, ClientError> {
        let api = self.api.clone();
        let id = external_id.clone();
        let value = self
            .ctx
            .cache()
            .fetch(
                CacheKey::admin_order(external_id.clone()),
                LIST_STALENESS,
                move || {
                    let api = api.clone();
                    let id = id.clone();
                    async move {
                        api.get_order(&id)
                            .await
                            .map(|order| CacheValue::AdminOrder(Box::new(order)))
                    }
                },
            )
            .await?;
        Ok(value.into_order().expect("admin order key holds orders"))
    }

    /// # Errors
    ///
    /// `409` for an illegal status transition; normalized transport errors
    /// otherwise.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        external_id: &OrderId,
        status: OrderStatus,
    ) -> Result<OrderDto, ClientError> {
        let request = AdminUpdateOrderStatusRequest { status };
        match self.api.update_order_status(external_id, &request).await {
            Ok(order) => {
                self.ctx.cache().invalidate(EntityKind::AdminOrders);
                self.ctx.notifier().success("Order status updated.");
                Ok(order)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn customers(
        &self,
        params: &AdminListCustomersParams,
    ) -> Result<Page<CustomerDto>, ClientError> {
        let api = self.api.clone();
        let params_owned = params.clone();
        let value = self
            .ctx
            .cache()
            .fetch(
                CacheKey::admin_customers(params),
                LIST_STALENESS,
                move || {
                    let api = api.clone();
                    let params = params_owned.clone();
                    async move {
                        api.list_customers(&params)
                            .await
                            .map(CacheValue::AdminCustomers)
                    }
                },
            )
            .await?;
        Ok(value
            .into_customers()
            .expect("admin customers key holds customer pages"))
    }

    /// # Errors
    ///
    /// `404` for an unknown customer; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn customer(&self, id: &CustomerId) -> Result<CustomerDto, ClientError> {
        let api = self.api.clone();
        let id_owned = id.clone();
        let value = self
            .ctx
            .cache()
            .fetch(
                CacheKey::admin_customer(id.clone()),
                LIST_STALENESS,
                move || {
                    let api = api.clone();
                    let id = id_owned.clone();
                    async move {
                        api.get_customer(&id)
                            .await
                            .map(|customer| CacheValue::AdminCustomer(Box::new(customer)))
                    }
                },
            )
            .await?;
        Ok(value.into_customer().expect("admin customer key holds customers"))
    }

    /// # Errors
    ///
    /// `404` for an unknown customer; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn enable_customer(&self, id: &CustomerId) -> Result<CustomerDto, ClientError> {
        match self.api.enable_customer(id).await {
            Ok(customer) => {
                self.ctx.cache().invalidate(EntityKind::AdminCustomers);
                self.ctx.notifier().success("Customer account enabled.");
                Ok(customer)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// # Errors
    ///
    /// `404` for an unknown customer; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn disable_customer(&self, id: &CustomerId) -> Result<CustomerDto, ClientError> {
        match self.api.disable_customer(id).await {
            Ok(customer) => {
                self.ctx.cache().invalidate(EntityKind::AdminCustomers);
                self.ctx.notifier().success("Customer account disabled.");
                Ok(customer)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Upload a file (product imagery) via multipart/form-data.
    ///
    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self, bytes))]
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ContentUploadResponse, ClientError> {
        match self.content.upload(file_name, bytes).await {
            Ok(response) => Ok(response),
            Err(error) => Err(self.surface(error.into())),
        }
    }
}
