//! Session lifecycle end to end: login seeding, the 401 cascade, and
//! cross-tab logout propagation between two independent contexts.

use std::sync::Arc;

use clementine_client::{InProcessBus, MessageBus, NoticeLevel};
use clementine_core::{ListProductsParams, LoginRequest, UserRole};
use clementine_integration_tests::{CUSTOMER_EMAIL, drain_notices, harness, harness_with};

#[tokio::test]
async fn test_login_seeds_the_session_atomically() {
    let h = harness().await;
    h.login_customer().await;

    let session = h.ctx.session();
    assert!(session.is_authenticated());
    let user = session.current_user().expect("user");
    assert_eq!(user.email, CUSTOMER_EMAIL);
    assert_eq!(user.role, UserRole::Customer);
    assert!(session.bearer_token().is_some());
}

#[tokio::test]
async fn test_bad_credentials_leave_the_session_anonymous() {
    let h = harness().await;
    let err = h
        .ctx
        .storefront()
        .login(&LoginRequest {
            email: CUSTOMER_EMAIL.to_string(),
            password: "wrong".to_string(),
        })
        .await
        .expect_err("login must fail");

    assert_eq!(err.status(), Some(401));
    assert!(!h.ctx.session().is_authenticated());
}

#[tokio::test]
async fn test_unauthorized_response_cascades() {
    let h = harness().await;
    h.login_customer().await;
    assert!(h.ctx.session().is_authenticated());

    let mut notices = h.ctx.notices();
    h.backend.set_unauthorized(true);

    let err = h
        .ctx
        .storefront()
        .products(&ListProductsParams::default())
        .await
        .expect_err("request must fail");

    // All three observations land together: the rejection carries status
    // 401, the session is cleared, and the notice was emitted.
    assert_eq!(err.status(), Some(401));
    assert!(!h.ctx.session().is_authenticated());
    let notices = drain_notices(&mut notices);
    assert!(
        notices
            .iter()
            .any(|n| n.level == NoticeLevel::Error
                && n.message == "Session expired. Please log in again.")
    );

    // 401 is not a transient failure: exactly one upstream attempt.
    assert_eq!(h.backend.hits("products"), 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = harness().await;
    h.login_customer().await;

    let storefront = h.ctx.storefront();
    storefront.logout();
    assert!(!h.ctx.session().is_authenticated());
    storefront.logout();
    assert!(!h.ctx.session().is_authenticated());
}

#[tokio::test]
async fn test_logout_in_one_tab_reaches_the_other() {
    // Two fully independent contexts ("tabs") sharing only the bus.
    let bus: Arc<dyn MessageBus> = Arc::new(InProcessBus::new());
    let tab_a = harness_with(Some(Arc::clone(&bus)), None, None).await;
    let tab_b = harness_with(Some(Arc::clone(&bus)), None, None).await;
    tab_a.login_customer().await;
    tab_b.login_customer().await;

    tab_a.ctx.storefront().logout();

    assert!(!tab_a.ctx.session().is_authenticated());
    assert!(!tab_b.ctx.session().is_authenticated());
}

#[tokio::test]
async fn test_forced_logout_on_401_also_reaches_the_other_tab() {
    let bus: Arc<dyn MessageBus> = Arc::new(InProcessBus::new());
    let tab_a = harness_with(Some(Arc::clone(&bus)), None, None).await;
    let tab_b = harness_with(Some(Arc::clone(&bus)), None, None).await;
    tab_a.login_customer().await;
    tab_b.login_customer().await;

    tab_a.backend.set_unauthorized(true);
    let _ = tab_a
        .ctx
        .storefront()
        .products(&ListProductsParams::default())
        .await;

    assert!(!tab_a.ctx.session().is_authenticated());
    assert!(!tab_b.ctx.session().is_authenticated());
}

#[tokio::test]
async fn test_register_responds_like_a_login() {
    let h = harness().await;
    let user = h
        .ctx
        .storefront()
        .register(&clementine_core::RegisterRequest {
            first_name: "New".to_string(),
            last_name: "Shopper".to_string(),
            email: "new@clementine.test".to_string(),
            password: "pw-123456".to_string(),
        })
        .await
        .expect("register");

    assert_eq!(user.role, UserRole::Customer);
    assert!(h.ctx.session().is_authenticated());
}
