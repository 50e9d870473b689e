//! Clementine Client SDK.
//!
//! A typed client for the Clementine e-commerce REST backend, built around a
//! session & cache consistency layer:
//!
//! - [`transport`] - HTTP transport that normalizes every failure into a
//!   single error shape and forces a logout on `401`
//! - [`session`] - the auth session (atomic set/clear, cross-tab logout sync)
//!   and the anonymous cart session (persisted across restarts)
//! - [`cache`] - a keyed entity cache with stale-while-revalidate semantics
//!   and request coalescing
//! - [`mutation`] - the optimistic mutation protocol: snapshot, predict,
//!   reconcile with the server value, roll back on failure
//! - [`guards`] - role-based admission decisions for UI routing
//! - [`storefront`] / [`admin`] - the two orchestration services tying the
//!   endpoint wrappers in [`api`] to the consistency layer
//!
//! # Architecture
//!
//! All shared state (session stores, cache, mutation tracker, notification
//! feed) lives in a single [`Context`] constructed from a [`ClientConfig`].
//! Components never reach into each other's internals; everything goes
//! through the operations on the stores.
//!
//! # Example
//!
//! ```rust,ignore
//! use clementine_client::{ClientConfig, Context};
//!
//! let config = ClientConfig::from_env()?;
//! let ctx = Context::builder(config).build();
//! let storefront = ctx.storefront();
//!
//! let cart = storefront.add_to_cart(request).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod bus;
pub mod cache;
pub mod config;
mod context;
pub mod error;
pub mod guards;
pub mod mutation;
pub mod notify;
pub mod session;
pub mod storefront;
pub mod transport;

pub use admin::Admin;
pub use bus::{InProcessBus, MessageBus, NoopBus, Subscription};
pub use cache::{CacheKey, CacheRecord, CacheValue, EntityCache, EntityKind, FetchStatus};
pub use config::{ClientConfig, ConfigError};
pub use context::{Context, ContextBuilder};
pub use error::{ApiError, ClientError, user_message};
pub use guards::{Admission, Redirect, admin_only, authenticated_only, customer_only};
pub use mutation::{MutationId, MutationPhase, MutationTracker};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use session::{
    CartSession, CartSessionStore, CurrentUser, FileStorage, MemoryStorage, SessionSnapshot,
    SessionStore, StorageBackend,
};
pub use storefront::Storefront;
