//! Storage backends for users, the catalog, and orders.
//!
//! The [`Store`] trait is the persistence seam of the system. Two
//! implementations are provided:
//!
//! - [`MemStore`]: process-local, used by tests and token-free dev setups.
//! - [`PgStore`]: Postgres via sqlx, used in production.
//!
//! Both back ends guarantee the same order-placement semantics: the order,
//! its line items, and the stock decrements commit together or not at all,
//! and concurrent placements against the same product are serialized so
//! stock can never go negative.

pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use error::StoreError;
pub use in_memory::MemStore;
pub use postgres::PgStore;
pub use r#trait::Store;
