//! Orders domain: the order/line-item model and the pricing workflow.
//!
//! The pricing workflow is the system's core: it turns product/quantity
//! requests into priced line items with a decimal-exact total, enforcing the
//! positive-quantity and stock-floor invariants. Persistence (and its
//! atomicity) is the store's concern; everything here is pure.

pub mod order;
pub mod workflow;

pub use order::{LineItem, Order, OrderStatus, PlacedOrder};
pub use workflow::{PricedLine, PricedOrder, RequestedLine, price_order};
