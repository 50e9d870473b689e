//! Storefront service: catalog browsing, cart, checkout, refunds, auth.
//!
//! Reads go through the entity cache with per-entity staleness windows;
//! cart mutations run the optimistic protocol in [`crate::mutation`]. Cart
//! policy lives here:
//!
//! - the first add-to-cart auto-creates the cart (not optimistic - there is
//!   nothing to predict without a real ID) and seeds the cart session
//!   before the item mutation fires
//! - setting a quantity below one becomes a removal before the protocol
//!   starts
//! - cart mutations with no session fail fast with
//!   [`ClientError::MissingCartSession`], never touching the network

use std::time::Duration;

use secrecy::SecretString;
use tracing::instrument;

use clementine_core::{
    AddCartItemRequest, AddressDto, AuthResponse, CartDto, CartId, CartItemId, CategoryDto,
    CreateOrderRequest, ListCategoriesParams, ListProductsParams, LoginRequest, OrderDto, OrderId,
    Page, ProductDto, RefundRequest, RefundResponseDto, RegisterRequest, SessionId,
    UpdateCartItemRequest,
};

use crate::api::{AuthApi, CartApi, CatalogApi, CheckoutApi, OrdersApi};
use crate::cache::{CacheKey, CacheValue};
use crate::context::Context;
use crate::error::{ClientError, user_message};
use crate::mutation::run_optimistic;
use crate::session::CurrentUser;

/// Categories change rarely; cache them aggressively.
const CATEGORY_STALENESS: Duration = Duration::from_secs(300);
/// Products change with admin edits and stock movements.
const PRODUCT_STALENESS: Duration = Duration::from_secs(60);
/// The cart is the most volatile entity the storefront shows.
const CART_STALENESS: Duration = Duration::from_secs(30);

/// Customer-facing surface of the SDK.
#[derive(Clone)]
pub struct Storefront {
    ctx: Context,
    auth: AuthApi,
    catalog: CatalogApi,
    cart: CartApi,
    checkout: CheckoutApi,
    orders: OrdersApi,
}

impl Storefront {
    #[must_use]
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            auth: ctx.auth_api(),
            catalog: ctx.catalog_api(),
            cart: ctx.cart_api(),
            checkout: ctx.checkout_api(),
            orders: ctx.orders_api(),
            ctx,
        }
    }

    /// Emit the single user-facing notice for a failed operation.
    fn surface(&self, error: ClientError) -> ClientError {
        self.ctx.notifier().error(user_message(&error));
        error
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Full category list (cached).
    ///
    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryDto>, ClientError> {
        let api = self.catalog.clone();
        let value = self
            .ctx
            .cache()
            .fetch(CacheKey::Categories, CATEGORY_STALENESS, move || {
                let api = api.clone();
                async move {
                    api.list_categories(&ListCategoriesParams::default())
                        .await
                        .map(CacheValue::Categories)
                }
            })
            .await?;
        Ok(value
            .into_categories()
            .expect("categories key holds category lists"))
    }

    /// Filtered product listing (cached per distinct parameter set).
    ///
    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        params: &ListProductsParams,
    ) -> Result<Page<ProductDto>, ClientError> {
        let api = self.catalog.clone();
        let params_owned = params.clone();
        let value = self
            .ctx
            .cache()
            .fetch(CacheKey::products(params), PRODUCT_STALENESS, move || {
                let api = api.clone();
                let params = params_owned.clone();
                async move { api.list_products(&params).await.map(CacheValue::Products) }
            })
            .await?;
        Ok(value.into_products().expect("products key holds product pages"))
    }

    /// Product detail by slug (cached).
    ///
    /// # Errors
    ///
    /// `404` for an unknown slug; normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<ProductDto, ClientError> {
        let api = self.catalog.clone();
        let slug_owned = slug.to_string();
        let value = self
            .ctx
            .cache()
            .fetch(CacheKey::product(slug), PRODUCT_STALENESS, move || {
                let api = api.clone();
                let slug = slug_owned.clone();
                async move {
                    api.product_by_slug(&slug)
                        .await
                        .map(|product| CacheValue::Product(Box::new(product)))
                }
            })
            .await?;
        Ok(value.into_product().expect("product key holds products"))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The current cart, or `None` when no cart session exists yet.
    ///
    /// # Errors
    ///
    /// Normalized transport errors once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<Option<CartDto>, ClientError> {
        let Some((cart_id, session_id)) = self.ctx.cart_session().get().pair() else {
            return Ok(None);
        };
        let api = self.cart.clone();
        let key = CacheKey::cart(cart_id.clone());
        let value = self
            .ctx
            .cache()
            .fetch(key, CART_STALENESS, move || {
                let api = api.clone();
                let cart_id = cart_id.clone();
                let session_id = session_id.clone();
                async move {
                    api.get(&cart_id, &session_id)
                        .await
                        .map(|cart| CacheValue::Cart(Box::new(cart)))
                }
            })
            .await?;
        Ok(value.into_cart())
    }

    /// Add a product to the cart, creating the cart first if none exists.
    ///
    /// No optimistic prediction is attempted (the server assigns the line
    /// item), but the snapshot/rollback machinery still protects the cached
    /// cart.
    ///
    /// # Errors
    ///
    /// Normalized transport errors; mutations are never retried.
    #[instrument(skip(self, request))]
    pub async fn add_to_cart(&self, request: AddCartItemRequest) -> Result<CartDto, ClientError> {
        let (cart_id, session_id) = self.ensure_cart_session().await?;
        let key = CacheKey::cart(cart_id.clone());

        let api = self.cart.clone();
        let result = run_optimistic(self.ctx.cache(), self.ctx.mutations(), key, None, move || {
            async move {
                api.add_item(&cart_id, &session_id, &request)
                    .await
                    .map(|cart| CacheValue::Cart(Box::new(cart)))
            }
        })
        .await;

        match result {
            Ok(value) => {
                self.ctx.notifier().success("Item added to cart");
                Ok(value.into_cart().expect("cart key holds carts"))
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// Set a line item's quantity. A quantity below one is substituted with
    /// a removal before the optimistic protocol starts, so the prediction
    /// and the request agree on which operation runs.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingCartSession`] without an active cart session;
    /// normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn change_quantity(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<CartDto, ClientError> {
        if quantity == 0 {
            return self.remove_item(item_id).await;
        }
        let Some((cart_id, session_id)) = self.ctx.cart_session().get().pair() else {
            return Err(self.surface(ClientError::MissingCartSession));
        };
        let key = CacheKey::cart(cart_id.clone());

        // Predict the new quantity; the total is left untouched - the server
        // recomputes it and its response wins on success.
        let predicted = self
            .ctx
            .cache()
            .read(&key)
            .and_then(|record| record.data)
            .and_then(CacheValue::into_cart)
            .map(|mut cart| {
                for item in &mut cart.items {
                    if item.id == *item_id {
                        item.quantity = quantity;
                    }
                }
                CacheValue::Cart(Box::new(cart))
            });

        let api = self.cart.clone();
        let item_id = item_id.clone();
        let request = UpdateCartItemRequest { quantity };
        let result = run_optimistic(
            self.ctx.cache(),
            self.ctx.mutations(),
            key,
            predicted,
            move || async move {
                api.update_item(&cart_id, &item_id, &session_id, &request)
                    .await
                    .map(|cart| CacheValue::Cart(Box::new(cart)))
            },
        )
        .await;

        match result {
            Ok(value) => Ok(value.into_cart().expect("cart key holds carts")),
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// Remove a line item from the cart.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingCartSession`] without an active cart session;
    /// normalized transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<CartDto, ClientError> {
        let Some((cart_id, session_id)) = self.ctx.cart_session().get().pair() else {
            return Err(self.surface(ClientError::MissingCartSession));
        };
        let key = CacheKey::cart(cart_id.clone());

        let predicted = self
            .ctx
            .cache()
            .read(&key)
            .and_then(|record| record.data)
            .and_then(CacheValue::into_cart)
            .map(|mut cart| {
                cart.items.retain(|item| item.id != *item_id);
                CacheValue::Cart(Box::new(cart))
            });

        let api = self.cart.clone();
        let item_id = item_id.clone();
        let result = run_optimistic(
            self.ctx.cache(),
            self.ctx.mutations(),
            key,
            predicted,
            move || async move {
                api.remove_item(&cart_id, &item_id, &session_id)
                    .await
                    .map(|cart| CacheValue::Cart(Box::new(cart)))
            },
        )
        .await;

        match result {
            Ok(value) => {
                self.ctx.notifier().success("Item removed");
                Ok(value.into_cart().expect("cart key holds carts"))
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// First cart interaction: create the server-side cart and seed the
    /// session store before any item mutation runs against it.
    async fn ensure_cart_session(&self) -> Result<(CartId, SessionId), ClientError> {
        if let Some(pair) = self.ctx.cart_session().get().pair() {
            return Ok(pair);
        }
        let cart = match self.cart.create().await {
            Ok(cart) => cart,
            Err(error) => return Err(self.surface(error.into())),
        };
        self.ctx
            .cart_session()
            .set(cart.id.clone(), cart.session_id.clone());
        let pair = (cart.id.clone(), cart.session_id.clone());
        self.ctx
            .cache()
            .write(CacheKey::cart(cart.id.clone()), CacheValue::Cart(Box::new(cart)));
        Ok(pair)
    }

    // =========================================================================
    // Checkout & refunds
    // =========================================================================

    /// Place the order. On success the server-side cart is consumed, so the
    /// cached cart entry is dropped and the cart session cleared.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingCartSession`] without an active cart;
    /// normalized transport errors otherwise.
    #[instrument(skip(self, shipping_address))]
    pub async fn checkout(&self, shipping_address: AddressDto) -> Result<OrderDto, ClientError> {
        let Some(cart_id) = self.ctx.cart_session().get().cart_id else {
            return Err(self.surface(ClientError::MissingCartSession));
        };
        let request = CreateOrderRequest {
            cart_id: cart_id.clone(),
            shipping_address,
        };
        match self.checkout.create_order(&request).await {
            Ok(order) => {
                self.ctx.cache().remove(&CacheKey::cart(cart_id));
                self.ctx.cart_session().clear();
                self.ctx.notifier().success("Order placed successfully!");
                Ok(order)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// File a refund request for an order.
    ///
    /// # Errors
    ///
    /// Normalized transport errors.
    #[instrument(skip(self, request))]
    pub async fn request_refund(
        &self,
        external_id: &OrderId,
        request: &RefundRequest,
    ) -> Result<RefundResponseDto, ClientError> {
        match self.orders.refund_request(external_id, request).await {
            Ok(response) => {
                self.ctx.notifier().success(
                    "Refund request submitted. Your request is PENDING review. \
                     We will notify you once processed.",
                );
                Ok(response)
            }
            Err(error) => Err(self.surface(error.into())),
        }
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Log in and seed the session atomically from the response.
    ///
    /// # Errors
    ///
    /// `401` for bad credentials; normalized transport errors otherwise.
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<CurrentUser, ClientError> {
        match self.auth.login(request).await {
            Ok(response) => Ok(self.seed_session(response)),
            Err(error) => Err(self.surface(error.into())),
        }
    }

    /// Register a new account; responds like a successful login.
    ///
    /// # Errors
    ///
    /// `409` when the email is taken; normalized transport errors otherwise.
    #[instrument(skip_all)]
    pub async fn register(&self, request: &RegisterRequest) -> Result<CurrentUser, ClientError> {
        match self.auth.register(request).await {
            Ok(response) => Ok(self.seed_session(response)),
            Err(error) => Err(self.surface(error.into())),
        }
    }

    fn seed_session(&self, response: AuthResponse) -> CurrentUser {
        let user = CurrentUser::from(response.user);
        self.ctx
            .session()
            .set_session(SecretString::from(response.token), user.clone());
        user
    }

    /// Log out locally and broadcast to every other tab.
    pub fn logout(&self) {
        self.ctx.session().logout();
    }

    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.ctx.session().current_user()
    }
}
