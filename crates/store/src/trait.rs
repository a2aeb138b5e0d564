//! The storage seam.

use async_trait::async_trait;

use tienda_auth::{NewUser, User};
use tienda_catalog::{NewProduct, Product, ProductPatch};
use tienda_core::{ProductId, UserId};
use tienda_orders::{PlacedOrder, RequestedLine};

use crate::StoreError;

/// Persistence operations used by the HTTP layer.
///
/// Read operations return `Ok(None)` for absent rows; writes that require an
/// existing row fail with `DomainError::NotFound` wrapped in
/// [`StoreError::Domain`].
#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----

    /// Insert a new user. Fails with a conflict if the username or email is
    /// already taken.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Look up by username first, then by email (login identifier).
    async fn user_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError>;

    // ---- catalog ----

    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError>;

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError>;

    // ---- orders ----

    /// Place an order: price the requested lines, persist the order with its
    /// line items, and decrement stock — all atomically. On any failure
    /// (unknown product, bad quantity, insufficient stock, database error)
    /// nothing is persisted.
    async fn place_order(
        &self,
        user_id: UserId,
        requested: &[RequestedLine],
    ) -> Result<PlacedOrder, StoreError>;

    /// All orders of a user, most recently placed first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<PlacedOrder>, StoreError>;
}
