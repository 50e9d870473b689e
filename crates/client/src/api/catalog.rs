//! Public catalog endpoints.

use reqwest::Method;
use tracing::instrument;

use clementine_core::{
    CategoryDto, ListCategoriesParams, ListProductsParams, Page, ProductDto,
};

use crate::error::ApiError;
use crate::transport::Http;

/// `GET /api/v1/public/{categories,products}`.
#[derive(Clone)]
pub struct CatalogApi {
    http: Http,
}

impl CatalogApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        params: &ListCategoriesParams,
    ) -> Result<Vec<CategoryDto>, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, "/api/v1/public/categories")
                    .query(params),
            )
            .await
    }

    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        params: &ListProductsParams,
    ) -> Result<Page<ProductDto>, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, "/api/v1/public/products")
                    .query(params),
            )
            .await
    }

    /// # Errors
    ///
    /// `404` for an unknown slug; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<ProductDto, ApiError> {
        self.http
            .send(
                self.http
                    .request(Method::GET, &format!("/api/v1/public/products/{slug}")),
            )
            .await
    }
}
