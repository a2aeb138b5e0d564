//! Store error model.

use thiserror::Error;

use tienda_core::DomainError;

/// Error returned by [`crate::Store`] operations.
///
/// Domain failures (validation, not-found, conflicts) pass through unchanged
/// so the API layer can map them to stable client errors; anything coming
/// out of the database that is not a recognizable constraint violation is an
/// opaque `Database` failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database failure: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    /// Map sqlx errors, promoting unique-constraint violations (error code
    /// `23505`, e.g. duplicate username/email) to a domain conflict.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return StoreError::Domain(DomainError::conflict("already exists"));
            }
        }
        StoreError::Database(err)
    }
}

impl StoreError {
    /// The domain error carried by this store error, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            StoreError::Database(_) => None,
        }
    }
}
