//! Cache semantics against a real transport: coalescing, freshness,
//! stale-while-revalidate error handling, bounded read retries, timeouts,
//! and superseded background reads.

use std::time::Duration;

use clementine_client::{CacheKey, EntityKind, FetchStatus};
use clementine_core::{AddCartItemRequest, ListProductsParams, ProductId};
use clementine_integration_tests::{harness, harness_with};

#[tokio::test]
async fn test_concurrent_reads_coalesce_into_one_upstream_request() {
    let h = harness().await;
    h.backend.set_get_delay(Some(Duration::from_millis(80)));
    let storefront = h.ctx.storefront();
    let params = ListProductsParams::default();

    let (a, b) = tokio::join!(storefront.products(&params), storefront.products(&params));

    let a = a.expect("first fetch");
    let b = b.expect("second fetch");
    assert_eq!(a.items.len(), b.items.len());
    assert_eq!(h.backend.hits("products"), 1);
}

#[tokio::test]
async fn test_fresh_records_are_served_without_a_request() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let params = ListProductsParams::default();

    storefront.products(&params).await.expect("first fetch");
    storefront.products(&params).await.expect("second fetch");
    assert_eq!(h.backend.hits("products"), 1);

    // A different parameter set is a different record.
    let search = ListProductsParams {
        search: Some("tea".to_string()),
        ..ListProductsParams::default()
    };
    let page = storefront.products(&search).await.expect("search fetch");
    assert_eq!(page.items.len(), 1);
    assert_eq!(h.backend.hits("products"), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_known_good_data() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let params = ListProductsParams::default();

    storefront.products(&params).await.expect("initial fetch");
    h.ctx.cache().invalidate(EntityKind::Products);

    // Initial attempt plus two transparent retries, all failing.
    h.backend.fail_times(500, "boom", 3);
    let err = storefront
        .products(&params)
        .await
        .expect_err("refresh must fail");
    assert_eq!(err.status(), Some(500));
    assert_eq!(h.backend.hits("products"), 4);

    let record = h
        .ctx
        .cache()
        .read(&CacheKey::products(&params))
        .expect("record");
    assert_eq!(record.status, FetchStatus::Error);
    let page = record.data.expect("data retained").into_products().expect("page");
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_transient_read_failures_retry_transparently() {
    let h = harness().await;
    h.backend.fail_times(502, "bad gateway", 1);

    let page = h
        .ctx
        .storefront()
        .products(&ListProductsParams::default())
        .await
        .expect("fetch succeeds after retry");

    assert_eq!(page.items.len(), 2);
    assert_eq!(h.backend.hits("products"), 2);
}

#[tokio::test]
async fn test_timeout_surfaces_as_a_network_class_error() {
    let h = harness_with(None, None, Some(Duration::from_millis(150))).await;
    h.backend.set_get_delay(Some(Duration::from_millis(600)));

    let err = h
        .ctx
        .storefront()
        .products(&ListProductsParams::default())
        .await
        .expect_err("must time out");

    assert_eq!(err.status(), Some(0));
}

#[tokio::test]
async fn test_superseded_background_read_never_overwrites_a_mutation() {
    let h = harness().await;
    let storefront = h.ctx.storefront();
    let cart = storefront
        .add_to_cart(AddCartItemRequest {
            product_id: ProductId::new("prod-1"),
            quantity: 1,
        })
        .await
        .expect("add to cart");
    let item_id = cart.items.first().expect("item").id.clone();
    let key = CacheKey::cart(cart.id.clone());

    // Force the next cart() to reload, slowly: the stub snapshots the cart
    // before sleeping, so the delayed response is genuinely stale.
    h.ctx.cache().invalidate(EntityKind::Cart);
    h.backend.set_get_delay(Some(Duration::from_millis(150)));

    let slow_read = tokio::spawn({
        let storefront = storefront.clone();
        async move { storefront.cart().await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;

    // The mutation supersedes the in-flight read, then settles first.
    storefront
        .change_quantity(&item_id, 5)
        .await
        .expect("update");

    let _ = slow_read.await.expect("join");

    let record = h.ctx.cache().read(&key).expect("record");
    let cached = record
        .data
        .expect("data")
        .into_cart()
        .expect("cart value");
    assert_eq!(
        cached.items.first().expect("item").quantity,
        5,
        "stale read must not clobber the reconciled mutation"
    );
}
