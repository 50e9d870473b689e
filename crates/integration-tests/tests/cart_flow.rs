//! Cart mutation flows: auto-created carts, optimistic rollback and
//! reconciliation, the decrement-to-removal substitution, and checkout.

use rust_decimal::Decimal;

use clementine_client::{CacheKey, ClientError};
use clementine_core::{AddCartItemRequest, CartDto, CartItemId, OrderStatus, ProductId};
use clementine_integration_tests::{drain_notices, harness, shipping_address};

fn add_request(product: &str, quantity: u32) -> AddCartItemRequest {
    AddCartItemRequest {
        product_id: ProductId::new(product),
        quantity,
    }
}

fn first_item_id(cart: &CartDto) -> CartItemId {
    cart.items.first().expect("cart has an item").id.clone()
}

fn cached_cart(ctx: &clementine_client::Context, cart: &CartDto) -> CartDto {
    ctx.cache()
        .read(&CacheKey::cart(cart.id.clone()))
        .expect("cart record")
        .data
        .expect("cart data")
        .into_cart()
        .expect("cart value")
}

#[tokio::test]
async fn test_first_add_creates_the_cart_and_seeds_the_session() {
    let h = harness().await;
    let mut notices = h.ctx.notices();
    let storefront = h.ctx.storefront();

    let cart = storefront
        .add_to_cart(add_request("prod-1", 1))
        .await
        .expect("add to cart");

    assert!(h.ctx.cart_session().get().is_active());
    assert_eq!(cart.items.len(), 1);
    assert_eq!(h.backend.hits("cart_create"), 1);

    // A second add reuses the existing cart.
    storefront
        .add_to_cart(add_request("prod-2", 1))
        .await
        .expect("second add");
    assert_eq!(h.backend.hits("cart_create"), 1);
    assert_eq!(h.backend.hits("cart_add"), 2);

    let notices = drain_notices(&mut notices);
    assert!(notices.iter().any(|n| n.message == "Item added to cart"));
}

#[tokio::test]
async fn test_failed_update_rolls_back_to_the_snapshot() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let cart = storefront
        .add_to_cart(add_request("prod-1", 1))
        .await
        .expect("add to cart");
    let item_id = first_item_id(&cart);

    h.backend.fail_next(422, "Quantity exceeds available stock");
    let err = storefront
        .change_quantity(&item_id, 2)
        .await
        .expect_err("update must fail");
    assert_eq!(err.status(), Some(422));

    // The predicted quantity 2 never survives settlement.
    let cached = cached_cart(&h.ctx, &cart);
    assert_eq!(cached.items.first().expect("item").quantity, 1);
    // Mutations are never retried, not even on transient-looking failures.
    assert_eq!(h.backend.hits("cart_update"), 1);
}

#[tokio::test]
async fn test_failed_mutations_are_not_retried_even_on_5xx() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let cart = storefront
        .add_to_cart(add_request("prod-1", 1))
        .await
        .expect("add to cart");

    h.backend.fail_next(500, "boom");
    let err = storefront
        .add_to_cart(add_request("prod-2", 1))
        .await
        .expect_err("second add must fail");
    assert_eq!(err.status(), Some(500));
    assert_eq!(h.backend.hits("cart_add"), 2);

    // Rollback restored the one-item cart.
    let cached = cached_cart(&h.ctx, &cart);
    assert_eq!(cached.items.len(), 1);
}

#[tokio::test]
async fn test_successful_update_reconciles_with_server_totals() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let cart = storefront
        .add_to_cart(add_request("prod-1", 1))
        .await
        .expect("add to cart");
    let item_id = first_item_id(&cart);

    let updated = storefront
        .change_quantity(&item_id, 2)
        .await
        .expect("update");

    // 2 x 9.99, computed server-side; the local prediction never touched
    // the total.
    assert_eq!(updated.total, Decimal::new(1998, 2));
    let cached = cached_cart(&h.ctx, &cart);
    assert_eq!(cached.total, Decimal::new(1998, 2));
    assert_eq!(cached.items.first().expect("item").quantity, 2);
}

#[tokio::test]
async fn test_decrement_below_one_issues_a_removal() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let cart = storefront
        .add_to_cart(add_request("prod-1", 1))
        .await
        .expect("add to cart");
    let item_id = first_item_id(&cart);

    let updated = storefront
        .change_quantity(&item_id, 0)
        .await
        .expect("decrement to zero");

    assert!(updated.items.is_empty());
    assert_eq!(h.backend.hits("cart_remove"), 1);
    assert_eq!(h.backend.hits("cart_update"), 0);
    assert_eq!(cached_cart(&h.ctx, &cart).items.len(), 0);
}

#[tokio::test]
async fn test_mutation_without_a_session_fails_fast_and_locally() {
    let h = harness().await;
    let mut notices = h.ctx.notices();

    let err = h
        .ctx
        .storefront()
        .change_quantity(&CartItemId::new("item-1"), 3)
        .await
        .expect_err("must fail");

    assert!(matches!(err, ClientError::MissingCartSession));
    // Nothing reached the network.
    assert_eq!(h.backend.hits("cart_create"), 0);
    assert_eq!(h.backend.hits("cart_update"), 0);
    assert_eq!(h.backend.hits("cart_remove"), 0);

    let notices = drain_notices(&mut notices);
    assert!(
        notices
            .iter()
            .any(|n| n.message == "No active cart. Please add items to your cart first.")
    );
}

#[tokio::test]
async fn test_checkout_clears_the_cart_session_and_cache() {
    let h = harness().await;
    let mut notices = h.ctx.notices();
    let storefront = h.ctx.storefront();
    let cart = storefront
        .add_to_cart(add_request("prod-1", 2))
        .await
        .expect("add to cart");

    let order = storefront
        .checkout(shipping_address())
        .await
        .expect("checkout");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Decimal::new(1998, 2));
    assert_eq!(h.backend.order_count(), 1);

    assert!(!h.ctx.cart_session().get().is_active());
    assert!(h.ctx.cache().read(&CacheKey::cart(cart.id.clone())).is_none());
    assert!(h.backend.cart(&cart.id).is_none(), "server cart consumed");

    let notices = drain_notices(&mut notices);
    assert!(
        notices
            .iter()
            .any(|n| n.message == "Order placed successfully!")
    );
}

#[tokio::test]
async fn test_checkout_without_a_cart_fails_fast() {
    let h = harness().await;
    let err = h
        .ctx
        .storefront()
        .checkout(shipping_address())
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::MissingCartSession));
    assert_eq!(h.backend.hits("checkout"), 0);
}

#[tokio::test]
async fn test_refund_request_emits_the_pending_review_notice() {
    let h = harness().await;
    let mut notices = h.ctx.notices();
    let storefront = h.ctx.storefront();
    storefront
        .add_to_cart(add_request("prod-1", 1))
        .await
        .expect("add to cart");
    let order = storefront
        .checkout(shipping_address())
        .await
        .expect("checkout");

    let refund = storefront
        .request_refund(
            &order.external_id,
            &clementine_core::RefundRequest {
                amount: order.total,
                reason: "Arrived chipped".to_string(),
            },
        )
        .await
        .expect("refund request");

    assert_eq!(refund.order_id, order.external_id);
    let notices = drain_notices(&mut notices);
    assert!(
        notices
            .iter()
            .any(|n| n.message.starts_with("Refund request submitted"))
    );
}
