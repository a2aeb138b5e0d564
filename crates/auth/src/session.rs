//! Opaque server-side session tokens.
//!
//! Login issues a [`SessionToken`]; the store keeps the token → user mapping
//! with an expiry. Tokens are passed explicitly (`Authorization: Bearer`),
//! never derived from ambient state.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tienda_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// Opaque session token (UUIDv7 under the hood).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn mint() -> Self {
        Self(Uuid::now_v7())
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s)
            .map(Self)
            .map_err(|_| DomainError::Unauthorized)
    }
}

/// One live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-process session registry.
///
/// The map is small and accessed briefly, so a plain mutex is enough; no
/// lock is held across await points.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<SessionToken, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh token for an authenticated user.
    pub fn issue(&self, user_id: UserId, username: &str, role: Role) -> Session {
        let now = Utc::now();
        let session = Session {
            token: SessionToken::mint(),
            user_id,
            username: username.to_string(),
            role,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        self.sessions
            .lock()
            .expect("session store poisoned")
            .insert(session.token, session.clone());

        tracing::debug!(user_id = %user_id, "issued session token");
        session
    }

    /// Resolve a token to its live session.
    ///
    /// Expired tokens are removed on sight and rejected as unauthorized.
    pub fn resolve(&self, token: SessionToken) -> DomainResult<Session> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");

        match sessions.get(&token) {
            Some(session) if !session.is_expired(Utc::now()) => Ok(session.clone()),
            Some(_) => {
                sessions.remove(&token);
                Err(DomainError::Unauthorized)
            }
            None => Err(DomainError::Unauthorized),
        }
    }

    /// Drop a session (logout).
    pub fn revoke(&self, token: SessionToken) {
        self.sessions
            .lock()
            .expect("session store poisoned")
            .remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_ttl(minutes: i64) -> SessionStore {
        SessionStore::new(Duration::minutes(minutes))
    }

    #[test]
    fn issued_token_resolves_to_its_user() {
        let store = store_with_ttl(10);
        let session = store.issue(UserId::new(7), "ana", Role::Customer);

        let resolved = store.resolve(session.token).unwrap();
        assert_eq!(resolved.user_id, UserId::new(7));
        assert_eq!(resolved.username, "ana");
    }

    #[test]
    fn unknown_token_is_unauthorized() {
        let store = store_with_ttl(10);
        let bogus: SessionToken = Uuid::now_v7().to_string().parse().unwrap();
        assert_eq!(store.resolve(bogus).unwrap_err(), DomainError::Unauthorized);
    }

    #[test]
    fn expired_token_is_rejected_and_removed() {
        let store = store_with_ttl(-1); // already expired at issue time
        let session = store.issue(UserId::new(1), "ana", Role::Admin);

        assert_eq!(
            store.resolve(session.token).unwrap_err(),
            DomainError::Unauthorized
        );
        // Second resolve hits the "removed" path.
        assert_eq!(
            store.resolve(session.token).unwrap_err(),
            DomainError::Unauthorized
        );
    }

    #[test]
    fn revoked_token_no_longer_resolves() {
        let store = store_with_ttl(10);
        let session = store.issue(UserId::new(2), "eva", Role::Customer);
        store.revoke(session.token);
        assert!(store.resolve(session.token).is_err());
    }

    #[test]
    fn malformed_token_string_fails_to_parse() {
        assert!("not-a-uuid".parse::<SessionToken>().is_err());
    }
}
