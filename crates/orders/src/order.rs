use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tienda_core::{Amount, LineItemId, OrderId, ProductId, UserId};

/// Order status lifecycle.
///
/// The order workflow only ever creates `Pending`; later transitions belong
/// to a fulfilment process outside this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Parse the stored representation (inverse of [`OrderStatus::as_str`]).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placed order. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Set once at creation.
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    /// Derived: always the exact sum of the line-item subtotals.
    pub total: Amount,
}

/// One product-quantity-subtotal record belonging to exactly one order.
///
/// `product_name` and `unit_price` are snapshots taken at order time; later
/// catalog edits do not affect historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Amount,
    pub subtotal: Amount,
}

/// An order together with its line items, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<LineItem>,
}
