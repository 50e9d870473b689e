//! Route authorization guards.
//!
//! Pure functions from the current session state to an admission decision.
//! Guards are evaluated on every navigation against a fresh snapshot -
//! decisions are never cached.
//!
//! The three redirect targets are deliberately distinct: an expired session
//! goes to login, a customer on an admin route hits the forbidden page, and
//! an admin on a customer-only route silently falls back to the landing
//! page (checkout is customer-scoped UX, not a security boundary).

use clementine_core::UserRole;

use crate::session::SessionStore;

/// Where a rejected navigation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Forbidden,
    Home,
}

impl Redirect {
    /// Route path of the redirect target.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Forbidden => "/403",
            Self::Home => "/",
        }
    }
}

/// Admission decision for a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Grant,
    Redirect(Redirect),
}

/// Admits any authenticated user; anonymous visitors go to login. The
/// attempted destination is discarded (no deep-link return).
#[must_use]
pub fn authenticated_only(session: &SessionStore) -> Admission {
    if session.snapshot().authenticated {
        Admission::Grant
    } else {
        Admission::Redirect(Redirect::Login)
    }
}

/// Admits only `ADMIN` users. Anonymous visitors go to login; authenticated
/// non-admins hit the forbidden page - the two cases must stay
/// distinguishable (expired session vs. insufficient privilege).
#[must_use]
pub fn admin_only(session: &SessionStore) -> Admission {
    let snapshot = session.snapshot();
    if !snapshot.authenticated {
        return Admission::Redirect(Redirect::Login);
    }
    if snapshot.role == Some(UserRole::Admin) {
        Admission::Grant
    } else {
        Admission::Redirect(Redirect::Forbidden)
    }
}

/// Admits only `CUSTOMER` users. Anonymous visitors go to login; admins
/// fall back to the landing page rather than an error.
#[must_use]
pub fn customer_only(session: &SessionStore) -> Admission {
    let snapshot = session.snapshot();
    if !snapshot.authenticated {
        return Admission::Redirect(Redirect::Login);
    }
    if snapshot.role == Some(UserRole::Customer) {
        Admission::Grant
    } else {
        Admission::Redirect(Redirect::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::NoopBus;
    use crate::session::CurrentUser;
    use clementine_core::UserId;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn session_with(role: Option<UserRole>) -> SessionStore {
        let store = SessionStore::new(Arc::new(NoopBus));
        if let Some(role) = role {
            store.set_session(
                SecretString::from("tok"),
                CurrentUser {
                    id: UserId::new("user-1"),
                    email: "user@example.com".to_string(),
                    role,
                },
            );
        }
        store
    }

    #[test]
    fn test_anonymous_visitor_is_sent_to_login_everywhere() {
        let session = session_with(None);
        assert_eq!(
            authenticated_only(&session),
            Admission::Redirect(Redirect::Login)
        );
        assert_eq!(admin_only(&session), Admission::Redirect(Redirect::Login));
        assert_eq!(
            customer_only(&session),
            Admission::Redirect(Redirect::Login)
        );
    }

    #[test]
    fn test_customer_on_admin_route_hits_forbidden_not_login() {
        let session = session_with(Some(UserRole::Customer));
        assert_eq!(
            admin_only(&session),
            Admission::Redirect(Redirect::Forbidden)
        );
    }

    #[test]
    fn test_admin_on_customer_route_falls_back_to_home() {
        let session = session_with(Some(UserRole::Admin));
        assert_eq!(customer_only(&session), Admission::Redirect(Redirect::Home));
    }

    #[test]
    fn test_matching_roles_are_granted() {
        let admin = session_with(Some(UserRole::Admin));
        let customer = session_with(Some(UserRole::Customer));
        assert_eq!(admin_only(&admin), Admission::Grant);
        assert_eq!(customer_only(&customer), Admission::Grant);
        assert_eq!(authenticated_only(&admin), Admission::Grant);
        assert_eq!(authenticated_only(&customer), Admission::Grant);
    }

    #[test]
    fn test_decisions_follow_session_transitions() {
        // No caching across navigations: the decision flips as soon as the
        // session does.
        let session = session_with(Some(UserRole::Customer));
        assert_eq!(customer_only(&session), Admission::Grant);
        session.logout();
        assert_eq!(
            customer_only(&session),
            Admission::Redirect(Redirect::Login)
        );
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(Redirect::Login.path(), "/login");
        assert_eq!(Redirect::Forbidden.path(), "/403");
        assert_eq!(Redirect::Home.path(), "/");
    }
}
