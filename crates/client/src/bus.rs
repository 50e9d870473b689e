//! Cross-tab message bus.
//!
//! Logout must propagate to every open tab sharing the browser profile. The
//! SDK abstracts the platform's tab-messaging facility behind a small
//! publish/subscribe trait, selected at construction time:
//!
//! - [`InProcessBus`] - real implementation, synchronous fan-out to every
//!   subscriber of a topic (a publisher's own subscriptions included, which
//!   matches publishing through a fresh channel handle)
//! - [`NoopBus`] - for runtimes without a tab-messaging facility; publish
//!   and subscribe are inert, so logout still succeeds locally
//!
//! Dropping a [`Subscription`] releases the underlying handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Topic carrying forced-logout messages between tabs.
pub const LOGOUT_TOPIC: &str = "auth:logout";

/// The only payload published on [`LOGOUT_TOPIC`].
pub const LOGOUT_MESSAGE: &str = r#"{"type":"LOGOUT"}"#;

/// Returns true when a bus payload is a logout broadcast.
#[must_use]
pub fn is_logout_message(payload: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| value.get("type").and_then(|t| t.as_str().map(String::from)))
        .is_some_and(|kind| kind == "LOGOUT")
}

type Handler = Arc<dyn Fn(&str) + Send + Sync>;

/// Publish/subscribe channel shared by all "tabs" of one browser profile.
pub trait MessageBus: Send + Sync {
    /// Deliver `payload` to every current subscriber of `topic`. Must never
    /// block or fail; delivery to zero subscribers is a no-op.
    fn publish(&self, topic: &str, payload: &str);

    /// Register a handler for `topic`. The handler stays active until the
    /// returned [`Subscription`] is dropped or closed.
    fn subscribe(&self, topic: &str, handler: Box<dyn Fn(&str) + Send + Sync>) -> Subscription;
}

/// Handle to an active subscription; unsubscribes when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// A subscription with nothing behind it (used by [`NoopBus`]).
    #[must_use]
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Explicitly release the handler now instead of at drop time.
    pub fn close(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct BusState {
    topics: HashMap<String, Vec<(u64, Handler)>>,
}

/// In-process bus: every subscriber of a topic receives each published
/// payload synchronously, in subscription order.
#[derive(Clone, Default)]
pub struct InProcessBus {
    state: Arc<Mutex<BusState>>,
    next_id: Arc<AtomicU64>,
}

impl InProcessBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageBus for InProcessBus {
    fn publish(&self, topic: &str, payload: &str) {
        // Collect handlers under the lock, invoke outside it: a handler may
        // itself publish or subscribe.
        let handlers: Vec<Handler> = {
            let state = self.state.lock();
            state
                .topics
                .get(topic)
                .map(|subs| subs.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            handler(payload);
        }
    }

    fn subscribe(&self, topic: &str, handler: Box<dyn Fn(&str) + Send + Sync>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handler: Handler = Arc::from(handler);
        self.state
            .lock()
            .topics
            .entry(topic.to_string())
            .or_default()
            .push((id, handler));

        let state: Weak<Mutex<BusState>> = Arc::downgrade(&self.state);
        let topic = topic.to_string();
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(state) = state.upgrade() {
                    let mut state = state.lock();
                    if let Some(subs) = state.topics.get_mut(&topic) {
                        subs.retain(|(sub_id, _)| *sub_id != id);
                    }
                }
            })),
        }
    }
}

/// Bus for environments without a tab-messaging facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBus;

impl MessageBus for NoopBus {
    fn publish(&self, _topic: &str, _payload: &str) {}

    fn subscribe(&self, _topic: &str, _handler: Box<dyn Fn(&str) + Send + Sync>) -> Subscription {
        Subscription::inert()
    }
}
