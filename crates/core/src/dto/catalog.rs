//! Catalog DTOs: categories and products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: CategoryId,
    pub name: String,
    /// URL-safe identifier used in category routes.
    pub slug: String,
}

/// A storefront product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    pub name: String,
    /// URL-safe identifier used in product routes.
    pub slug: String,
    pub description: String,
    /// Unit price as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Remaining stock; the server rejects cart quantities above this.
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub category: CategoryDto,
}

/// Query parameters for `GET /api/v1/public/categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Query parameters for `GET /api/v1/public/products`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn test_product_price_is_a_json_number() {
        let json = r#"{
            "id": "prod-1",
            "name": "Espresso Cup",
            "slug": "espresso-cup",
            "description": "A small cup.",
            "price": 9.99,
            "stock": 12,
            "category": {"id": "cat-1", "name": "Kitchen", "slug": "kitchen"}
        }"#;
        let product: ProductDto = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.price, Decimal::from_f64(9.99).expect("decimal"));
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn test_list_params_omit_unset_filters() {
        let params = ListProductsParams {
            search: Some("cup".to_string()),
            ..ListProductsParams::default()
        };
        let json = serde_json::to_string(&params).expect("serialize");
        assert_eq!(json, r#"{"search":"cup"}"#);
    }
}
