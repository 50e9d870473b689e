//! Wire DTOs for the Clementine REST API.
//!
//! Field names follow the backend's JSON conventions (camelCase); money
//! amounts are JSON numbers deserialized into [`rust_decimal::Decimal`].

mod admin;
mod auth;
mod cart;
mod catalog;
mod common;
mod content;
mod order;

pub use admin::*;
pub use auth::*;
pub use cart::*;
pub use catalog::*;
pub use common::*;
pub use content::*;
pub use order::*;
