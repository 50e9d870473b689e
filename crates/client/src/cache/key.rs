//! Cache keys.
//!
//! A key identifies one cached server entity (or list); `kind()` is the
//! invalidation prefix grouping every key that a given mutation makes stale.

use serde::Serialize;

use clementine_core::{
    AdminListCustomersParams, AdminListOrdersParams, AdminListProductsParams, CartId, CustomerId,
    ListProductsParams, OrderId,
};

/// Identifies one cached entity record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Categories,
    Products { params: String },
    Product { slug: String },
    Cart { cart_id: CartId },
    AdminCategories,
    AdminProducts { params: String },
    AdminOrders { params: String },
    AdminOrder { external_id: OrderId },
    AdminCustomers { params: String },
    AdminCustomer { id: CustomerId },
}

impl CacheKey {
    #[must_use]
    pub fn products(params: &ListProductsParams) -> Self {
        Self::Products {
            params: fingerprint(params),
        }
    }

    #[must_use]
    pub fn product(slug: impl Into<String>) -> Self {
        Self::Product { slug: slug.into() }
    }

    #[must_use]
    pub const fn cart(cart_id: CartId) -> Self {
        Self::Cart { cart_id }
    }

    #[must_use]
    pub fn admin_products(params: &AdminListProductsParams) -> Self {
        Self::AdminProducts {
            params: fingerprint(params),
        }
    }

    #[must_use]
    pub fn admin_orders(params: &AdminListOrdersParams) -> Self {
        Self::AdminOrders {
            params: fingerprint(params),
        }
    }

    #[must_use]
    pub const fn admin_order(external_id: OrderId) -> Self {
        Self::AdminOrder { external_id }
    }

    #[must_use]
    pub fn admin_customers(params: &AdminListCustomersParams) -> Self {
        Self::AdminCustomers {
            params: fingerprint(params),
        }
    }

    #[must_use]
    pub const fn admin_customer(id: CustomerId) -> Self {
        Self::AdminCustomer { id }
    }

    /// The invalidation prefix this key belongs to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Categories => EntityKind::Categories,
            Self::Products { .. } | Self::Product { .. } => EntityKind::Products,
            Self::Cart { .. } => EntityKind::Cart,
            Self::AdminCategories => EntityKind::AdminCategories,
            Self::AdminProducts { .. } => EntityKind::AdminProducts,
            Self::AdminOrders { .. } | Self::AdminOrder { .. } => EntityKind::AdminOrders,
            Self::AdminCustomers { .. } | Self::AdminCustomer { .. } => EntityKind::AdminCustomers,
        }
    }
}

/// Invalidation prefix: one kind covers every list and detail key of the
/// entity type it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Categories,
    Products,
    Cart,
    AdminCategories,
    AdminProducts,
    AdminOrders,
    AdminCustomers,
}

/// Stable textual fingerprint of a parameter struct, so each distinct query
/// gets its own cache record.
fn fingerprint<T: Serialize>(params: &T) -> String {
    serde_json::to_string(params).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_params_produce_distinct_keys() {
        let all = CacheKey::products(&ListProductsParams::default());
        let search = CacheKey::products(&ListProductsParams {
            search: Some("cup".to_string()),
            ..ListProductsParams::default()
        });
        assert_ne!(all, search);
        assert_eq!(all, CacheKey::products(&ListProductsParams::default()));
    }

    #[test]
    fn test_detail_keys_share_their_list_kind() {
        assert_eq!(CacheKey::product("mug").kind(), EntityKind::Products);
        assert_eq!(
            CacheKey::admin_order(OrderId::new("ord-1")).kind(),
            EntityKind::AdminOrders
        );
        assert_eq!(
            CacheKey::admin_customer(CustomerId::new("cus-1")).kind(),
            EntityKind::AdminCustomers
        );
    }
}
