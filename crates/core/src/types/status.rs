//! Status enums for orders and refunds.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, payment not yet confirmed.
    #[default]
    Pending,
    /// Payment confirmed, awaiting fulfillment.
    Confirmed,
    /// Handed to the carrier.
    Shipped,
    /// Delivered to the customer.
    Delivered,
    /// Cancelled before fulfillment.
    Cancelled,
    /// Fully refunded.
    Refunded,
}

/// Review status of a customer refund request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// Awaiting review.
    #[default]
    Pending,
    /// Approved and scheduled for payout.
    Approved,
    /// Rejected by support.
    Rejected,
}
