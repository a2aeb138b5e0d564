//! Catalog domain: products, their validation, and partial updates.

pub mod product;

pub use product::{NewProduct, Product, ProductPatch};
