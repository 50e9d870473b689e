//! Client-held session state.
//!
//! Two independent identities:
//!
//! - [`SessionStore`] - the authentication session (bearer token + user),
//!   in-memory only, cleared by logout or a `401` response
//! - [`CartSessionStore`] - the anonymous cart identity, persisted to
//!   best-effort durable storage so it survives restarts

mod auth;
mod cart;

pub use auth::{CurrentUser, SessionSnapshot, SessionStore};
pub use cart::{
    CART_SESSION_KEY, CartSession, CartSessionStore, FileStorage, MemoryStorage, StorageBackend,
};
