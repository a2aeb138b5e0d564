//! Password hashing and verification (Argon2).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use tienda_core::{DomainError, DomainResult};

/// Hash a plain-text password into an Argon2 PHC string.
///
/// Empty passwords are rejected up front; everything else is a validation
/// concern left to the caller.
pub fn hash_password(password: &str) -> DomainResult<String> {
    if password.is_empty() {
        return Err(DomainError::validation("password must not be empty"));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::invariant(format!("password hashing failed: {e}")))
}

/// Verify a plain-text password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on a mismatch; only malformed stored hashes or
/// internal hasher failures produce an error.
pub fn verify_password(stored_hash: &str, provided: &str) -> DomainResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| DomainError::invariant(format!("stored password hash is invalid: {e}")))?;

    match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DomainError::invariant(format!(
            "password verification failed: {e}"
        ))),
    }
}
