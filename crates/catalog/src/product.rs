use serde::{Deserialize, Serialize};

use tienda_core::{Amount, DomainError, DomainResult, ProductId};

/// A catalog product.
///
/// `condition` is a free-form label ("nuevo", "usado", ...); the catalog does
/// not constrain it. `image` is an opaque reference into an external blob
/// store (a relative path); the API layer renders it as an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Unit price, fixed-point decimal, never negative.
    pub price: Amount,
    /// Units available for sale, never negative.
    pub stock: i64,
    pub condition: String,
    pub image: Option<String>,
}

impl Product {
    /// Whether `quantity` units can be sold from current stock.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }

    /// Apply a partial update, revalidating the result.
    pub fn apply_patch(&self, patch: ProductPatch) -> DomainResult<Product> {
        let updated = Product {
            id: self.id,
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            description: patch.description.unwrap_or_else(|| self.description.clone()),
            category: patch.category.unwrap_or_else(|| self.category.clone()),
            price: patch.price.unwrap_or(self.price),
            stock: patch.stock.unwrap_or(self.stock),
            condition: patch.condition.unwrap_or_else(|| self.condition.clone()),
            image: patch.image.or_else(|| self.image.clone()),
        };
        validate_fields(&updated.name, updated.price, updated.stock)?;
        Ok(updated)
    }
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Amount,
    pub stock: i64,
    pub condition: String,
    pub image: Option<String>,
}

impl NewProduct {
    pub fn validate(
        name: String,
        description: String,
        category: String,
        price: Amount,
        stock: i64,
        condition: String,
        image: Option<String>,
    ) -> DomainResult<Self> {
        validate_fields(&name, price, stock)?;
        Ok(Self {
            name,
            description,
            category,
            price,
            stock,
            condition,
            image,
        })
    }
}

/// Partial product update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Amount>,
    pub stock: Option<i64>,
    pub condition: Option<String>,
    pub image: Option<String>,
}

fn validate_fields(name: &str, price: Amount, stock: i64) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("product name must not be empty"));
    }
    if price.is_sign_negative() {
        return Err(DomainError::validation("price must not be negative"));
    }
    if stock < 0 {
        return Err(DomainError::validation("stock must not be negative"));
    }
    Ok(())
}
