//! Authentication session store.
//!
//! Holds the bearer token and the identity of the logged-in user. The store
//! has exactly two states - `Anonymous` and `Authenticated` - and both fields
//! change together under one lock, so no reader can ever observe a token
//! without a user or vice versa.

use std::sync::Arc;

use parking_lot::RwLock;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use clementine_core::{UserDto, UserId, UserRole};

use crate::bus::{LOGOUT_MESSAGE, LOGOUT_TOPIC, MessageBus, Subscription, is_logout_message};

/// Minimal identity of the logged-in user kept client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl From<UserDto> for CurrentUser {
    fn from(user: UserDto) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Atomic snapshot of the session used by route guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub role: Option<UserRole>,
}

#[derive(Default)]
struct AuthState {
    token: Option<SecretString>,
    user: Option<CurrentUser>,
}

struct SessionInner {
    state: RwLock<AuthState>,
    bus: Arc<dyn MessageBus>,
}

/// Process-wide authentication session.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(AuthState::default()),
                bus,
            }),
        }
    }

    /// Transition to `Authenticated`. Token and user are assigned under one
    /// write lock; a concurrent reader sees either both or neither.
    pub fn set_session(&self, token: SecretString, user: CurrentUser) {
        let mut state = self.inner.state.write();
        state.token = Some(token);
        state.user = Some(user);
        drop(state);
        tracing::debug!("session established");
    }

    /// Transition to `Anonymous` and broadcast the logout to other tabs.
    ///
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        self.clear_local();
        self.inner.bus.publish(LOGOUT_TOPIC, LOGOUT_MESSAGE);
        tracing::debug!("logged out");
    }

    /// Clear the session without broadcasting (the receive path of a
    /// cross-tab logout; re-publishing here would echo forever).
    pub fn clear_local(&self) {
        let mut state = self.inner.state.write();
        state.token = None;
        state.user = None;
    }

    /// Install the cross-tab logout listener. The listener stays active
    /// until the returned subscription is dropped.
    #[must_use]
    pub fn attach_cross_tab_sync(&self) -> Subscription {
        let store = self.clone();
        self.inner.bus.subscribe(
            LOGOUT_TOPIC,
            Box::new(move |payload| {
                if is_logout_message(payload) {
                    store.clear_local();
                }
            }),
        )
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.inner.state.read();
        state.token.is_some() && state.user.is_some()
    }

    /// Token to attach as `Authorization: Bearer ...`, consulted at
    /// send-time. `None` means the header is omitted entirely.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.inner.state.read().token.clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.inner.state.read().user.clone()
    }

    /// One consistent read of (authenticated, role) for guard evaluation.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.read();
        SessionSnapshot {
            authenticated: state.token.is_some() && state.user.is_some(),
            role: state.user.as_ref().map(|user| user.role),
        }
    }
}
