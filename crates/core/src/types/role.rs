//! User roles.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated user.
///
/// The backend encodes roles as uppercase strings (`"ADMIN"`, `"CUSTOMER"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Back-office administrator with access to the admin console.
    Admin,
    /// Regular shopper.
    Customer,
}

impl UserRole {
    /// The wire representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserRole::Admin).expect("serialize"),
            "\"ADMIN\""
        );
        let role: UserRole = serde_json::from_str("\"CUSTOMER\"").expect("deserialize");
        assert_eq!(role, UserRole::Customer);
    }
}
