//! User roles.

use serde::{Deserialize, Serialize};

/// Closed role enumeration.
///
/// Registration always assigns [`Role::Customer`]; admin accounts are
/// provisioned out of band (seed data or direct store access).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Customer,
}

impl Role {
    /// Wire value for the login response's `userType` field.
    pub fn user_type(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "user",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }

    /// Parse the stored representation (inverse of [`Role::as_str`]).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_type_matches_wire_contract() {
        assert_eq!(Role::Admin.user_type(), "admin");
        assert_eq!(Role::Customer.user_type(), "user");
    }

    #[test]
    fn parse_round_trips() {
        for role in [Role::Admin, Role::Customer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("trabajador"), None);
    }
}
