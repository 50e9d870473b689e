//! Cart DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dto::catalog::ProductDto;
use crate::types::{CartId, CartItemId, ProductId, SessionId};

/// An anonymous server-side cart.
///
/// `total` is always server-computed; clients never derive it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub id: CartId,
    /// Session token the server expects back in the `X-SESSION-ID` header.
    pub session_id: SessionId,
    pub items: Vec<CartItemDto>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// A line item inside a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub id: CartItemId,
    pub product: ProductDto,
    pub quantity: u32,
    /// Price per unit at the time the item was added.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Payload for `POST /api/v1/public/cart/{cartId}/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Payload for `PUT /api/v1/public/cart/{cartId}/items/{itemId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}
