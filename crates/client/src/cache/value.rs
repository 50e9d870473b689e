//! Cached value types.

use clementine_core::{CartDto, CategoryDto, CustomerDto, OrderDto, Page, ProductDto};

/// The payload stored under a [`super::CacheKey`].
///
/// Each key constructor pairs with exactly one variant; the accessors below
/// exist so readers can get the typed payload back out.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<CategoryDto>),
    Products(Page<ProductDto>),
    Product(Box<ProductDto>),
    Cart(Box<CartDto>),
    AdminCategories(Vec<CategoryDto>),
    AdminProducts(Page<ProductDto>),
    AdminOrders(Page<OrderDto>),
    AdminOrder(Box<OrderDto>),
    AdminCustomers(Page<CustomerDto>),
    AdminCustomer(Box<CustomerDto>),
}

impl CacheValue {
    #[must_use]
    pub fn as_cart(&self) -> Option<&CartDto> {
        match self {
            Self::Cart(cart) => Some(cart),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_cart(self) -> Option<CartDto> {
        match self {
            Self::Cart(cart) => Some(*cart),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_categories(self) -> Option<Vec<CategoryDto>> {
        match self {
            Self::Categories(categories) | Self::AdminCategories(categories) => Some(categories),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_products(self) -> Option<Page<ProductDto>> {
        match self {
            Self::Products(page) | Self::AdminProducts(page) => Some(page),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_product(self) -> Option<ProductDto> {
        match self {
            Self::Product(product) => Some(*product),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_orders(self) -> Option<Page<OrderDto>> {
        match self {
            Self::AdminOrders(page) => Some(page),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_order(self) -> Option<OrderDto> {
        match self {
            Self::AdminOrder(order) => Some(*order),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_customers(self) -> Option<Page<CustomerDto>> {
        match self {
            Self::AdminCustomers(page) => Some(page),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_customer(self) -> Option<CustomerDto> {
        match self {
            Self::AdminCustomer(customer) => Some(*customer),
            _ => None,
        }
    }
}
