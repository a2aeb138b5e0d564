//! User model and registration input validation.

use serde::{Deserialize, Serialize};

use tienda_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string; never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Validated registration input (password already hashed by the caller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// Validate raw registration fields.
    ///
    /// `first_name`/`last_name` are optional and default to empty, matching
    /// the registration contract.
    pub fn validate(
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        password_hash: String,
    ) -> DomainResult<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }

        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email is malformed"));
        }

        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.unwrap_or_default().trim().to_string(),
            last_name: last_name.unwrap_or_default().trim().to_string(),
            password_hash,
            role: Role::Customer,
        })
    }
}
