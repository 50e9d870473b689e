//! In-process stub backend plus harness helpers for SDK integration tests.
//!
//! The stub implements every endpoint the SDK talks to, backed by an
//! in-memory state with fault injection:
//!
//! - [`TestBackend::fail_times`] - force the next N requests to fail with a
//!   given status and message
//! - [`TestBackend::set_unauthorized`] - answer every request with `401`
//! - [`TestBackend::set_get_delay`] - add artificial latency to GETs
//! - [`TestBackend::hits`] - per-route request counters, for asserting
//!   coalescing/retry behavior
//!
//! Tests build a [`TestHarness`]: the backend plus a fully wired SDK
//! [`Context`] using in-memory storage and an in-process message bus.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use clementine_client::{
    ClientConfig, Context, InProcessBus, MemoryStorage, MessageBus, Notice, StorageBackend,
};
use clementine_core::{
    AddCartItemRequest, AddressDto, AdminCreateCategoryRequest, AdminCreateProductRequest,
    AdminUpdateCategoryRequest, AdminUpdateOrderStatusRequest, AdminUpdateProductRequest,
    CartDto, CartId, CartItemDto, CartItemId, CategoryDto, CategoryId, CreateOrderRequest,
    CustomerDto, CustomerId, LoginRequest, OrderDto, OrderId, OrderStatus, Page, ProductDto,
    ProductId, RefundId, RefundRequest, RefundResponseDto, RefundStatus, RegisterRequest,
    SessionId, UserDto, UserId, UserRole,
};

pub const ADMIN_EMAIL: &str = "admin@clementine.test";
pub const ADMIN_PASSWORD: &str = "admin-pw";
pub const CUSTOMER_EMAIL: &str = "shopper@clementine.test";
pub const CUSTOMER_PASSWORD: &str = "shopper-pw";

const ADMIN_TOKEN: &str = "tok-admin";
const CUSTOMER_TOKEN: &str = "tok-customer";

// =============================================================================
// Backend state
// =============================================================================

struct StoredUser {
    email: String,
    password: String,
    user: UserDto,
}

struct BackendState {
    users: Vec<StoredUser>,
    categories: Vec<CategoryDto>,
    products: Vec<ProductDto>,
    carts: HashMap<CartId, CartDto>,
    orders: Vec<OrderDto>,
    customers: Vec<CustomerDto>,
    next_id: u32,
    hits: HashMap<String, u32>,
    /// `(status, message, remaining)` - consumed one request at a time.
    fail: Option<(u16, String, u32)>,
    all_unauthorized: bool,
    get_delay: Option<Duration>,
}

impl BackendState {
    fn seeded() -> Self {
        let kitchen = CategoryDto {
            id: CategoryId::new("cat-1"),
            name: "Kitchen".to_string(),
            slug: "kitchen".to_string(),
        };
        let products = vec![
            ProductDto {
                id: ProductId::new("prod-1"),
                name: "Espresso Cup".to_string(),
                slug: "espresso-cup".to_string(),
                description: "A small cup.".to_string(),
                price: Decimal::new(999, 2),
                stock: 10,
                image_url: None,
                category: kitchen.clone(),
            },
            ProductDto {
                id: ProductId::new("prod-2"),
                name: "Teapot".to_string(),
                slug: "teapot".to_string(),
                description: "Holds tea.".to_string(),
                price: Decimal::new(2450, 2),
                stock: 5,
                image_url: None,
                category: kitchen.clone(),
            },
        ];
        Self {
            users: vec![
                StoredUser {
                    email: ADMIN_EMAIL.to_string(),
                    password: ADMIN_PASSWORD.to_string(),
                    user: UserDto {
                        id: UserId::new("user-admin"),
                        email: ADMIN_EMAIL.to_string(),
                        role: UserRole::Admin,
                    },
                },
                StoredUser {
                    email: CUSTOMER_EMAIL.to_string(),
                    password: CUSTOMER_PASSWORD.to_string(),
                    user: UserDto {
                        id: UserId::new("user-shopper"),
                        email: CUSTOMER_EMAIL.to_string(),
                        role: UserRole::Customer,
                    },
                },
            ],
            categories: vec![kitchen],
            products,
            carts: HashMap::new(),
            orders: Vec::new(),
            customers: vec![CustomerDto {
                id: CustomerId::new("cus-1"),
                email: CUSTOMER_EMAIL.to_string(),
                first_name: "Sam".to_string(),
                last_name: "Shopper".to_string(),
                enabled: true,
                created_at: Utc::now(),
            }],
            next_id: 1,
            hits: HashMap::new(),
            fail: None,
            all_unauthorized: false,
            get_delay: None,
        }
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("{prefix}-{id}")
    }

    fn recompute_total(cart: &mut CartDto) {
        cart.total = cart
            .items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();
    }
}

type Shared = Arc<Mutex<BackendState>>;

// =============================================================================
// Response helpers
// =============================================================================

fn json<T: serde::Serialize>(value: &T) -> Response {
    axum::Json(serde_json::json!(value)).into_response()
}

fn error(status: u16, message: &str, code: Option<&str>) -> Response {
    let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "message": message,
        "status": status,
        "code": code,
    });
    (status_code, axum::Json(body)).into_response()
}

/// Per-request bookkeeping: count the hit, then apply fault injection.
async fn gate(state: &Shared, route: &str, is_get: bool) -> Result<(), Response> {
    let (fail, unauthorized, delay) = {
        let mut state = state.lock();
        *state.hits.entry(route.to_string()).or_insert(0) += 1;
        let fail = match &mut state.fail {
            Some((status, message, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Some((*status, message.clone()))
            }
            _ => None,
        };
        (fail, state.all_unauthorized, state.get_delay)
    };

    if is_get && let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if unauthorized {
        return Err(error(401, "Token expired", Some("TOKEN_EXPIRED")));
    }
    if let Some((status, message)) = fail {
        return Err(error(status, &message, None));
    }
    Ok(())
}

fn require_admin(headers: &HeaderMap) -> Result<(), Response> {
    match headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        Some(value) if value == format!("Bearer {ADMIN_TOKEN}") => Ok(()),
        Some(_) => Err(error(403, "Admin role required", None)),
        None => Err(error(401, "Authentication required", None)),
    }
}

fn check_cart_session(cart: &CartDto, headers: &HeaderMap) -> Result<(), Response> {
    let provided = headers
        .get("X-SESSION-ID")
        .and_then(|value| value.to_str().ok());
    if provided == Some(cart.session_id.as_str()) {
        Ok(())
    } else {
        Err(error(403, "Invalid cart session", None))
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(State(state): State<Shared>, body: axum::Json<LoginRequest>) -> Response {
    if let Err(response) = gate(&state, "login", false).await {
        return response;
    }
    let state = state.lock();
    let found = state
        .users
        .iter()
        .find(|user| user.email == body.email && user.password == body.password);
    match found {
        Some(stored) => {
            let token = match stored.user.role {
                UserRole::Admin => ADMIN_TOKEN,
                UserRole::Customer => CUSTOMER_TOKEN,
            };
            json(&serde_json::json!({"token": token, "user": stored.user.clone()}))
        }
        None => error(401, "Invalid credentials", None),
    }
}

async fn register(State(state): State<Shared>, body: axum::Json<RegisterRequest>) -> Response {
    if let Err(response) = gate(&state, "register", false).await {
        return response;
    }
    let mut state = state.lock();
    if state.users.iter().any(|user| user.email == body.email) {
        return error(409, "Email already registered", None);
    }
    let id = state.fresh_id("user");
    let user = UserDto {
        id: UserId::new(id),
        email: body.email.clone(),
        role: UserRole::Customer,
    };
    state.users.push(StoredUser {
        email: body.email.clone(),
        password: body.password.clone(),
        user: user.clone(),
    });
    json(&serde_json::json!({"token": CUSTOMER_TOKEN, "user": user}))
}

async fn list_categories(State(state): State<Shared>) -> Response {
    if let Err(response) = gate(&state, "categories", true).await {
        return response;
    }
    json(&state.lock().categories)
}

async fn list_products(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = gate(&state, "products", true).await {
        return response;
    }
    let state = state.lock();
    let items: Vec<ProductDto> = state
        .products
        .iter()
        .filter(|product| match params.get("search") {
            Some(needle) => product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        })
        .cloned()
        .collect();
    let total = items.len() as u64;
    json(&Page {
        items,
        total,
        page: 1,
        page_size: 20,
    })
}

async fn get_product(State(state): State<Shared>, Path(slug): Path<String>) -> Response {
    if let Err(response) = gate(&state, "product", true).await {
        return response;
    }
    let state = state.lock();
    match state.products.iter().find(|product| product.slug == slug) {
        Some(product) => json(product),
        None => error(404, "Product not found", None),
    }
}

async fn create_cart(State(state): State<Shared>) -> Response {
    if let Err(response) = gate(&state, "cart_create", false).await {
        return response;
    }
    let mut state = state.lock();
    let cart_id = CartId::new(state.fresh_id("cart"));
    let session_id = SessionId::new(state.fresh_id("sess"));
    let cart = CartDto {
        id: cart_id.clone(),
        session_id,
        items: Vec::new(),
        total: Decimal::ZERO,
    };
    state.carts.insert(cart_id, cart.clone());
    json(&cart)
}

async fn get_cart(
    State(state): State<Shared>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    // The GET delay is applied after the state read, so a delayed response
    // carries a genuinely stale snapshot of the cart.
    if let Err(response) = gate(&state, "cart_get", false).await {
        return response;
    }
    let (cart, delay) = {
        let state = state.lock();
        let Some(cart) = state.carts.get(&CartId::new(cart_id)) else {
            return error(404, "Cart not found", None);
        };
        if let Err(response) = check_cart_session(cart, &headers) {
            return response;
        }
        (cart.clone(), state.get_delay)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    json(&cart)
}

async fn add_cart_item(
    State(state): State<Shared>,
    Path(cart_id): Path<String>,
    headers: HeaderMap,
    body: axum::Json<AddCartItemRequest>,
) -> Response {
    if let Err(response) = gate(&state, "cart_add", false).await {
        return response;
    }
    let mut state = state.lock();
    let Some(product) = state
        .products
        .iter()
        .find(|product| product.id == body.product_id)
        .cloned()
    else {
        return error(404, "Product not found", None);
    };
    if body.quantity > product.stock {
        return error(422, "Quantity exceeds available stock", None);
    }
    let item_id = CartItemId::new(state.fresh_id("item"));
    let Some(cart) = state.carts.get_mut(&CartId::new(cart_id)) else {
        return error(404, "Cart not found", None);
    };
    if let Err(response) = check_cart_session(cart, &headers) {
        return response;
    }
    match cart
        .items
        .iter_mut()
        .find(|item| item.product.id == body.product_id)
    {
        Some(item) => item.quantity += body.quantity,
        None => cart.items.push(CartItemDto {
            id: item_id,
            unit_price: product.price,
            product,
            quantity: body.quantity,
        }),
    }
    BackendState::recompute_total(cart);
    json(cart)
}

async fn update_cart_item(
    State(state): State<Shared>,
    Path((cart_id, item_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::Json<clementine_core::UpdateCartItemRequest>,
) -> Response {
    if let Err(response) = gate(&state, "cart_update", false).await {
        return response;
    }
    let mut state = state.lock();
    let Some(cart) = state.carts.get_mut(&CartId::new(cart_id)) else {
        return error(404, "Cart not found", None);
    };
    if let Err(response) = check_cart_session(cart, &headers) {
        return response;
    }
    let Some(item) = cart
        .items
        .iter_mut()
        .find(|item| item.id == CartItemId::new(item_id.clone()))
    else {
        return error(404, "Cart item not found", None);
    };
    if body.quantity > item.product.stock {
        return error(422, "Quantity exceeds available stock", None);
    }
    item.quantity = body.quantity;
    BackendState::recompute_total(cart);
    json(cart)
}

async fn remove_cart_item(
    State(state): State<Shared>,
    Path((cart_id, item_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = gate(&state, "cart_remove", false).await {
        return response;
    }
    let mut state = state.lock();
    let Some(cart) = state.carts.get_mut(&CartId::new(cart_id)) else {
        return error(404, "Cart not found", None);
    };
    if let Err(response) = check_cart_session(cart, &headers) {
        return response;
    }
    cart.items
        .retain(|item| item.id != CartItemId::new(item_id.clone()));
    BackendState::recompute_total(cart);
    json(cart)
}

async fn create_order(State(state): State<Shared>, body: axum::Json<CreateOrderRequest>) -> Response {
    if let Err(response) = gate(&state, "checkout", false).await {
        return response;
    }
    let mut state = state.lock();
    let Some(cart) = state.carts.remove(&body.cart_id) else {
        return error(404, "Cart not found", None);
    };
    let external_id = OrderId::new(state.fresh_id("ord"));
    let order = OrderDto {
        external_id,
        status: OrderStatus::Pending,
        total: cart.total,
        items: cart.items,
        shipping_address: body.shipping_address.clone(),
        created_at: Utc::now(),
    };
    state.orders.push(order.clone());
    json(&order)
}

async fn refund_request(
    State(state): State<Shared>,
    Path(external_id): Path<String>,
    body: axum::Json<RefundRequest>,
) -> Response {
    if let Err(response) = gate(&state, "refund", false).await {
        return response;
    }
    let mut state = state.lock();
    if !state
        .orders
        .iter()
        .any(|order| order.external_id == OrderId::new(external_id.clone()))
    {
        return error(404, "Order not found", None);
    }
    let id = RefundId::new(state.fresh_id("rf"));
    json(&RefundResponseDto {
        id,
        order_id: OrderId::new(external_id),
        amount: body.amount,
        reason: body.reason.clone(),
        status: RefundStatus::Pending,
        created_at: Utc::now(),
    })
}

// ---- admin -----------------------------------------------------------------

async fn admin_list_categories(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&state, "admin_categories", true).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    json(&state.lock().categories)
}

async fn admin_create_category(
    State(state): State<Shared>,
    headers: HeaderMap,
    body: axum::Json<AdminCreateCategoryRequest>,
) -> Response {
    if let Err(response) = gate(&state, "admin_category_create", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    if state
        .categories
        .iter()
        .any(|category| category.slug == body.slug)
    {
        return error(409, "Category slug already exists", None);
    }
    let id = CategoryId::new(state.fresh_id("cat"));
    let category = CategoryDto {
        id,
        name: body.name.clone(),
        slug: body.slug.clone(),
    };
    state.categories.push(category.clone());
    json(&category)
}

async fn admin_update_category(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: axum::Json<AdminUpdateCategoryRequest>,
) -> Response {
    if let Err(response) = gate(&state, "admin_category_update", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    let Some(category) = state
        .categories
        .iter_mut()
        .find(|category| category.id == CategoryId::new(id.clone()))
    else {
        return error(404, "Category not found", None);
    };
    if let Some(name) = &body.name {
        category.name = name.clone();
    }
    if let Some(slug) = &body.slug {
        category.slug = slug.clone();
    }
    json(&category.clone())
}

async fn admin_delete_category(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = gate(&state, "admin_category_delete", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    let id = CategoryId::new(id);
    if state
        .products
        .iter()
        .any(|product| product.category.id == id)
    {
        return error(
            409,
            "Category still has products assigned to it",
            Some("CATEGORY_IN_USE"),
        );
    }
    state.categories.retain(|category| category.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_list_products(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&state, "admin_products", true).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let state = state.lock();
    let total = state.products.len() as u64;
    json(&Page {
        items: state.products.clone(),
        total,
        page: 1,
        page_size: 20,
    })
}

async fn admin_create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    body: axum::Json<AdminCreateProductRequest>,
) -> Response {
    if let Err(response) = gate(&state, "admin_product_create", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    let Some(category) = state
        .categories
        .iter()
        .find(|category| category.id == body.category_id)
        .cloned()
    else {
        return error(404, "Category not found", None);
    };
    let id = ProductId::new(state.fresh_id("prod"));
    let product = ProductDto {
        id,
        name: body.name.clone(),
        slug: body.slug.clone(),
        description: body.description.clone(),
        price: body.price,
        stock: body.stock,
        image_url: body.image_url.clone(),
        category,
    };
    state.products.push(product.clone());
    json(&product)
}

async fn admin_update_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: axum::Json<AdminUpdateProductRequest>,
) -> Response {
    if let Err(response) = gate(&state, "admin_product_update", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    let Some(product) = state
        .products
        .iter_mut()
        .find(|product| product.id == ProductId::new(id.clone()))
    else {
        return error(404, "Product not found", None);
    };
    if let Some(name) = &body.name {
        product.name = name.clone();
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }
    json(&product.clone())
}

async fn admin_delete_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = gate(&state, "admin_product_delete", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    state
        .products
        .retain(|product| product.id != ProductId::new(id.clone()));
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&state, "admin_orders", true).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let state = state.lock();
    let total = state.orders.len() as u64;
    json(&Page {
        items: state.orders.clone(),
        total,
        page: 1,
        page_size: 20,
    })
}

async fn admin_get_order(
    State(state): State<Shared>,
    Path(external_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = gate(&state, "admin_order_get", true).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let state = state.lock();
    match state
        .orders
        .iter()
        .find(|order| order.external_id == OrderId::new(external_id.clone()))
    {
        Some(order) => json(order),
        None => error(404, "Order not found", None),
    }
}

async fn admin_update_order_status(
    State(state): State<Shared>,
    Path(external_id): Path<String>,
    headers: HeaderMap,
    body: axum::Json<AdminUpdateOrderStatusRequest>,
) -> Response {
    if let Err(response) = gate(&state, "admin_order_status", false).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let mut state = state.lock();
    let Some(order) = state
        .orders
        .iter_mut()
        .find(|order| order.external_id == OrderId::new(external_id.clone()))
    else {
        return error(404, "Order not found", None);
    };
    order.status = body.status;
    json(&order.clone())
}

async fn admin_list_customers(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = gate(&state, "admin_customers", true).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let state = state.lock();
    let total = state.customers.len() as u64;
    json(&Page {
        items: state.customers.clone(),
        total,
        page: 1,
        page_size: 20,
    })
}

async fn admin_get_customer(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = gate(&state, "admin_customer_get", true).await {
        return response;
    }
    if let Err(response) = require_admin(&headers) {
        return response;
    }
    let state = state.lock();
    match state
        .customers
        .iter()
        .find(|customer| customer.id == CustomerId::new(id.clone()))
    {
        Some(customer) => json(customer),
        None => error(404, "Customer not found", None),
    }
}

async fn admin_set_customer_enabled(
    state: &Shared,
    id: &str,
    headers: &HeaderMap,
    route: &str,
    enabled: bool,
) -> Response {
    if let Err(response) = gate(state, route, false).await {
        return response;
    }
    if let Err(response) = require_admin(headers) {
        return response;
    }
    let mut state = state.lock();
    let Some(customer) = state
        .customers
        .iter_mut()
        .find(|customer| customer.id == CustomerId::new(id.to_string()))
    else {
        return error(404, "Customer not found", None);
    };
    customer.enabled = enabled;
    json(&customer.clone())
}

async fn admin_enable_customer(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    admin_set_customer_enabled(&state, &id, &headers, "admin_customer_enable", true).await
}

async fn admin_disable_customer(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    admin_set_customer_enabled(&state, &id, &headers, "admin_customer_disable", false).await
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    if let Err(response) = gate(&state, "upload", false).await {
        return response;
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("unnamed").to_string();
            let Ok(bytes) = field.bytes().await else {
                return error(400, "Unreadable upload", None);
            };
            if bytes.is_empty() {
                return error(400, "Empty upload", None);
            }
            let id = state.lock().fresh_id("upl");
            return json(&serde_json::json!({
                "id": id,
                "url": format!("https://cdn.clementine.test/{id}/{file_name}"),
            }));
        }
    }
    error(400, "Missing file field", None)
}

// =============================================================================
// TestBackend
// =============================================================================

/// The running stub backend plus its control surface.
pub struct TestBackend {
    addr: SocketAddr,
    state: Shared,
}

impl TestBackend {
    /// Bind to an ephemeral port and serve the stub in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::seeded()));
        let router = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/register", post(register))
            .route("/api/v1/public/categories", get(list_categories))
            .route("/api/v1/public/products", get(list_products))
            .route("/api/v1/public/products/{slug}", get(get_product))
            .route("/api/v1/public/cart", post(create_cart))
            .route("/api/v1/public/cart/{cart_id}", get(get_cart))
            .route("/api/v1/public/cart/{cart_id}/items", post(add_cart_item))
            .route(
                "/api/v1/public/cart/{cart_id}/items/{item_id}",
                put(update_cart_item).delete(remove_cart_item),
            )
            .route("/api/v1/checkout/create-order", post(create_order))
            .route(
                "/api/v1/public/orders/{external_id}/refund-request",
                post(refund_request),
            )
            .route(
                "/api/v1/admin/categories",
                get(admin_list_categories).post(admin_create_category),
            )
            .route(
                "/api/v1/admin/categories/{id}",
                put(admin_update_category).delete(admin_delete_category),
            )
            .route(
                "/api/v1/admin/products",
                get(admin_list_products).post(admin_create_product),
            )
            .route(
                "/api/v1/admin/products/{id}",
                put(admin_update_product).delete(admin_delete_product),
            )
            .route("/api/v1/admin/orders", get(admin_list_orders))
            .route("/api/v1/admin/orders/{external_id}", get(admin_get_order))
            .route(
                "/api/v1/admin/orders/{external_id}/status",
                put(admin_update_order_status),
            )
            .route("/api/v1/admin/customers", get(admin_list_customers))
            .route("/api/v1/admin/customers/{id}", get(admin_get_customer))
            .route(
                "/api/v1/admin/customers/{id}/enable",
                put(admin_enable_customer),
            )
            .route(
                "/api/v1/admin/customers/{id}/disable",
                put(admin_disable_customer),
            )
            .route("/api/v1/content/upload", post(upload))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { addr, state }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests seen by a route tag (e.g. `"products"`, `"cart_update"`).
    #[must_use]
    pub fn hits(&self, route: &str) -> u32 {
        self.state.lock().hits.get(route).copied().unwrap_or(0)
    }

    /// Fail the next request with `status`/`message`.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.fail_times(status, message, 1);
    }

    /// Fail the next `count` requests with `status`/`message`.
    pub fn fail_times(&self, status: u16, message: &str, count: u32) {
        self.state.lock().fail = Some((status, message.to_string(), count));
    }

    /// Answer every request with `401` until switched off.
    pub fn set_unauthorized(&self, unauthorized: bool) {
        self.state.lock().all_unauthorized = unauthorized;
    }

    /// Delay every GET response by `delay`.
    pub fn set_get_delay(&self, delay: Option<Duration>) {
        self.state.lock().get_delay = delay;
    }

    /// Snapshot of a stored cart, for asserting server-side state.
    #[must_use]
    pub fn cart(&self, cart_id: &CartId) -> Option<CartDto> {
        self.state.lock().carts.get(cart_id).cloned()
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.state.lock().orders.len()
    }
}

// =============================================================================
// TestHarness
// =============================================================================

/// A stub backend wired to a fresh SDK context.
pub struct TestHarness {
    pub backend: TestBackend,
    pub ctx: Context,
}

/// Build a harness with in-memory storage and a private in-process bus.
pub async fn harness() -> TestHarness {
    harness_with(None, None, None).await
}

/// Build a harness with any of the defaults overridden.
pub async fn harness_with(
    bus: Option<Arc<dyn MessageBus>>,
    storage: Option<Arc<dyn StorageBackend>>,
    timeout: Option<Duration>,
) -> TestHarness {
    let backend = TestBackend::spawn().await;
    let url = url::Url::parse(&backend.base_url()).expect("stub url");
    let mut config = ClientConfig::new(url);
    if let Some(timeout) = timeout {
        config = config.with_timeout(timeout);
    }
    let mut builder = Context::builder(config)
        .bus(bus.unwrap_or_else(|| Arc::new(InProcessBus::new()) as Arc<dyn MessageBus>));
    builder = builder.storage(
        storage.unwrap_or_else(|| Arc::new(MemoryStorage::new()) as Arc<dyn StorageBackend>),
    );
    TestHarness {
        backend,
        ctx: builder.build(),
    }
}

impl TestHarness {
    /// Log in as the seeded admin account.
    ///
    /// # Panics
    ///
    /// Panics if the stub rejects the seeded credentials.
    pub async fn login_admin(&self) {
        self.ctx
            .storefront()
            .login(&LoginRequest {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("admin login");
    }

    /// Log in as the seeded customer account.
    ///
    /// # Panics
    ///
    /// Panics if the stub rejects the seeded credentials.
    pub async fn login_customer(&self) {
        self.ctx
            .storefront()
            .login(&LoginRequest {
                email: CUSTOMER_EMAIL.to_string(),
                password: CUSTOMER_PASSWORD.to_string(),
            })
            .await
            .expect("customer login");
    }
}

/// Drain everything currently sitting in a notice receiver.
pub fn drain_notices(rx: &mut tokio::sync::broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

/// A default shipping address for checkout tests.
#[must_use]
pub fn shipping_address() -> AddressDto {
    AddressDto {
        street: "1 Main St".to_string(),
        city: "Lund".to_string(),
        state: "Skane".to_string(),
        country: "SE".to_string(),
        postal_code: "22100".to_string(),
    }
}
