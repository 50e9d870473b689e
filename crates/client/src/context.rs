//! The explicitly constructed application context.
//!
//! Instead of language-level globals, every shared singleton - transport,
//! session stores, entity cache, mutation tracker, notification feed - lives
//! in one [`Context`] built from a [`ClientConfig`]. Tests construct
//! isolated contexts per case; applications build one at startup.

use std::sync::Arc;

use crate::admin::Admin;
use crate::api::{AdminApi, AuthApi, CartApi, CatalogApi, CheckoutApi, ContentApi, OrdersApi};
use crate::bus::{InProcessBus, MessageBus, Subscription};
use crate::cache::EntityCache;
use crate::config::ClientConfig;
use crate::mutation::MutationTracker;
use crate::notify::{Notice, Notifier};
use crate::session::{CartSessionStore, FileStorage, MemoryStorage, SessionStore, StorageBackend};
use crate::storefront::Storefront;
use crate::transport::Http;

/// Builder for [`Context`]; the message bus and storage backend are chosen
/// at construction time rather than probed at call sites.
pub struct ContextBuilder {
    config: ClientConfig,
    bus: Option<Arc<dyn MessageBus>>,
    storage: Option<Arc<dyn StorageBackend>>,
}

impl ContextBuilder {
    /// Use a specific message bus (e.g. [`crate::bus::NoopBus`] in runtimes
    /// without tab messaging, or a shared bus in tests).
    #[must_use]
    pub fn bus(mut self, bus: Arc<dyn MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Use a specific storage backend for persisted client state.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn build(self) -> Context {
        let bus = self
            .bus
            .unwrap_or_else(|| Arc::new(InProcessBus::new()) as Arc<dyn MessageBus>);
        let storage = self.storage.unwrap_or_else(|| match &self.config.state_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)) as Arc<dyn StorageBackend>,
            None => Arc::new(MemoryStorage::new()) as Arc<dyn StorageBackend>,
        });

        let notifier = Notifier::new();
        let session = SessionStore::new(bus);
        let cross_tab = session.attach_cross_tab_sync();
        let cart_session = CartSessionStore::new(storage);
        let http = Http::new(&self.config, session.clone(), notifier.clone());

        Context {
            inner: Arc::new(ContextInner {
                http,
                session,
                cart_session,
                cache: EntityCache::new(),
                mutations: MutationTracker::new(),
                notifier,
                _cross_tab: cross_tab,
            }),
        }
    }
}

struct ContextInner {
    http: Http,
    session: SessionStore,
    cart_session: CartSessionStore,
    cache: EntityCache,
    mutations: MutationTracker,
    notifier: Notifier,
    /// Keeps the cross-tab logout listener alive until the context is
    /// dropped (application teardown).
    _cross_tab: Subscription,
}

/// Shared application context. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    #[must_use]
    pub fn builder(config: ClientConfig) -> ContextBuilder {
        ContextBuilder {
            config,
            bus: None,
            storage: None,
        }
    }

    /// The storefront surface: catalog, cart, checkout, refunds, auth.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        Storefront::new(self.clone())
    }

    /// The admin surface: categories, products, orders, customers, uploads.
    #[must_use]
    pub fn admin(&self) -> Admin {
        Admin::new(self.clone())
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart_session(&self) -> &CartSessionStore {
        &self.inner.cart_session
    }

    #[must_use]
    pub fn cache(&self) -> &EntityCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn mutations(&self) -> &MutationTracker {
        &self.inner.mutations
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Subscribe to the user-facing notification feed.
    #[must_use]
    pub fn notices(&self) -> tokio::sync::broadcast::Receiver<Notice> {
        self.inner.notifier.subscribe()
    }

    pub(crate) fn auth_api(&self) -> AuthApi {
        AuthApi::new(self.inner.http.clone())
    }

    pub(crate) fn catalog_api(&self) -> CatalogApi {
        CatalogApi::new(self.inner.http.clone())
    }

    pub(crate) fn cart_api(&self) -> CartApi {
        CartApi::new(self.inner.http.clone())
    }

    pub(crate) fn checkout_api(&self) -> CheckoutApi {
        CheckoutApi::new(self.inner.http.clone())
    }

    pub(crate) fn orders_api(&self) -> OrdersApi {
        OrdersApi::new(self.inner.http.clone())
    }

    pub(crate) fn admin_api(&self) -> AdminApi {
        AdminApi::new(self.inner.http.clone())
    }

    pub(crate) fn content_api(&self) -> ContentApi {
        ContentApi::new(self.inner.http.clone())
    }
}
