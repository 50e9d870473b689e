//! Anonymous cart session store.
//!
//! The cart identity pair `{cartId, sessionId}` is independent of user
//! authentication (anonymous carts) and survives restarts via durable
//! storage. Storage is strictly best-effort: read/write failures are
//! swallowed and the in-memory value stays authoritative, so a broken disk
//! never takes down cart operations.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use clementine_core::{CartId, SessionId};

/// Storage key under which the cart session is persisted.
pub const CART_SESSION_KEY: &str = "cart_session";

/// Best-effort durable key/value storage.
///
/// Implementations report failures through `io::Result`; the session store
/// swallows them and falls back to its in-memory state.
pub trait StorageBackend: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> io::Result<()>;
    fn clear(&self, key: &str) -> io::Result<()>;
}

/// File-backed storage: one JSON file per key inside a state directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn store(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)
    }

    fn clear(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// In-memory storage for tests and environments without a writable disk.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> io::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// The anonymous cart identity pair. Both fields are set and cleared
/// together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSession {
    pub cart_id: Option<CartId>,
    pub session_id: Option<SessionId>,
}

impl CartSession {
    /// Both identifiers, when a cart session is active.
    #[must_use]
    pub fn pair(&self) -> Option<(CartId, SessionId)> {
        match (&self.cart_id, &self.session_id) {
            (Some(cart_id), Some(session_id)) => Some((cart_id.clone(), session_id.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cart_id.is_some() && self.session_id.is_some()
    }
}

/// Persisted wire shape: `{"cartId": ..., "sessionId": ...}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCartSession {
    cart_id: CartId,
    session_id: SessionId,
}

struct CartSessionInner {
    state: RwLock<CartSession>,
    storage: Arc<dyn StorageBackend>,
}

/// Process-wide cart session store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CartSessionStore {
    inner: Arc<CartSessionInner>,
}

impl CartSessionStore {
    /// Create the store, restoring any persisted session. Absent or corrupt
    /// storage yields an empty session.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        let state = Self::restore(storage.as_ref());
        Self {
            inner: Arc::new(CartSessionInner {
                state: RwLock::new(state),
                storage,
            }),
        }
    }

    fn restore(storage: &dyn StorageBackend) -> CartSession {
        let raw = match storage.load(CART_SESSION_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "cart session storage unreadable");
                None
            }
        };
        raw.and_then(|raw| serde_json::from_str::<StoredCartSession>(&raw).ok())
            .map_or_else(CartSession::default, |stored| CartSession {
                cart_id: Some(stored.cart_id),
                session_id: Some(stored.session_id),
            })
    }

    #[must_use]
    pub fn get(&self) -> CartSession {
        self.inner.state.read().clone()
    }

    /// Record a new cart identity and persist it (best effort).
    pub fn set(&self, cart_id: CartId, session_id: SessionId) {
        let stored = StoredCartSession {
            cart_id: cart_id.clone(),
            session_id: session_id.clone(),
        };
        match serde_json::to_string(&stored) {
            Ok(raw) => {
                if let Err(err) = self.inner.storage.store(CART_SESSION_KEY, &raw) {
                    tracing::warn!(error = %err, "cart session not persisted");
                }
            }
            Err(err) => tracing::warn!(error = %err, "cart session not serializable"),
        }
        *self.inner.state.write() = CartSession {
            cart_id: Some(cart_id),
            session_id: Some(session_id),
        };
    }

    /// Forget the cart identity (the server-side cart was consumed or the
    /// caller reset it) and drop the persisted copy (best effort).
    pub fn clear(&self) {
        if let Err(err) = self.inner.storage.clear(CART_SESSION_KEY) {
            tracing::warn!(error = %err, "cart session storage not cleared");
        }
        *self.inner.state.write() = CartSession::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage whose every access fails, simulating a broken disk.
    struct FailingStorage;

    impl StorageBackend for FailingStorage {
        fn load(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::other("disk on fire"))
        }
        fn store(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::other("disk on fire"))
        }
        fn clear(&self, _key: &str) -> io::Result<()> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_starts_with_empty_session() {
        let store = CartSessionStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(store.get(), CartSession::default());
        assert!(!store.get().is_active());
    }

    #[test]
    fn test_set_persists_and_survives_restart() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartSessionStore::new(Arc::clone(&storage) as Arc<dyn StorageBackend>);
        store.set(CartId::new("cart-1"), SessionId::new("sess-abc"));

        let raw = storage
            .load(CART_SESSION_KEY)
            .expect("load")
            .expect("persisted");
        assert_eq!(raw, r#"{"cartId":"cart-1","sessionId":"sess-abc"}"#);

        // A fresh store over the same storage restores the pair.
        let restarted = CartSessionStore::new(storage);
        assert_eq!(
            restarted.get().pair(),
            Some((CartId::new("cart-1"), SessionId::new("sess-abc")))
        );
    }

    #[test]
    fn test_clear_removes_persisted_entry() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartSessionStore::new(Arc::clone(&storage) as Arc<dyn StorageBackend>);
        store.set(CartId::new("cart-1"), SessionId::new("sess-abc"));
        store.clear();

        assert_eq!(store.get(), CartSession::default());
        assert_eq!(storage.load(CART_SESSION_KEY).expect("load"), None);
    }

    #[test]
    fn test_corrupt_storage_yields_empty_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .store(CART_SESSION_KEY, "{not json")
            .expect("seed corrupt value");
        let store = CartSessionStore::new(storage);
        assert_eq!(store.get(), CartSession::default());
    }

    #[test]
    fn test_failing_storage_never_breaks_the_store() {
        let store = CartSessionStore::new(Arc::new(FailingStorage));
        assert_eq!(store.get(), CartSession::default());

        store.set(CartId::new("cart-1"), SessionId::new("sess-abc"));
        assert!(store.get().is_active());

        store.clear();
        assert_eq!(store.get(), CartSession::default());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("clem-test-{}", uuid::Uuid::new_v4()));
        let storage = Arc::new(FileStorage::new(&dir));
        let store = CartSessionStore::new(Arc::clone(&storage) as Arc<dyn StorageBackend>);

        store.set(CartId::new("cart-9"), SessionId::new("sess-9"));
        let restarted = CartSessionStore::new(storage);
        assert!(restarted.get().is_active());

        restarted.clear();
        assert!(!CartSessionStore::new(Arc::new(FileStorage::new(&dir)))
            .get()
            .is_active());
        let _ = std::fs::remove_dir_all(dir);
    }
}
