//! Cart, checkout, and refund commands.

use clap::Subcommand;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use clementine_client::Context;
use clementine_core::{
    AddCartItemRequest, AddressDto, CartItemId, OrderId, ProductId, RefundRequest,
};

use super::print_json;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the current cart
    Show,
    /// Add a product to the cart (creates the cart on first use)
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line item's quantity (0 removes the item)
    SetQty { item_id: String, quantity: u32 },
    /// Remove a line item
    Remove { item_id: String },
    /// Place the order with a shipping address
    Checkout {
        #[arg(long)]
        street: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        postal_code: String,
    },
}

pub async fn run(ctx: &Context, action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = ctx.storefront();
    match action {
        CartAction::Show => match storefront.cart().await? {
            Some(cart) => print_json(&cart)?,
            None => println!("no active cart"),
        },
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let cart = storefront
                .add_to_cart(AddCartItemRequest {
                    product_id: ProductId::new(product_id),
                    quantity,
                })
                .await?;
            print_json(&cart)?;
        }
        CartAction::SetQty { item_id, quantity } => {
            let cart = storefront
                .change_quantity(&CartItemId::new(item_id), quantity)
                .await?;
            print_json(&cart)?;
        }
        CartAction::Remove { item_id } => {
            let cart = storefront.remove_item(&CartItemId::new(item_id)).await?;
            print_json(&cart)?;
        }
        CartAction::Checkout {
            street,
            city,
            state,
            country,
            postal_code,
        } => {
            let order = storefront
                .checkout(AddressDto {
                    street,
                    city,
                    state,
                    country,
                    postal_code,
                })
                .await?;
            print_json(&order)?;
        }
    }
    Ok(())
}

pub async fn refund(
    ctx: &Context,
    external_id: &str,
    amount: f64,
    reason: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let amount = Decimal::from_f64(amount).ok_or("amount is not a valid decimal")?;
    let response = ctx
        .storefront()
        .request_refund(
            &OrderId::new(external_id),
            &RefundRequest {
                amount,
                reason: reason.to_string(),
            },
        )
        .await?;
    print_json(&response)?;
    Ok(())
}
