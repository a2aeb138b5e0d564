use serde::Deserialize;
use serde_json::json;

use tienda_catalog::Product;
use tienda_core::money;
use tienda_orders::PlacedOrder;

use rust_decimal::prelude::ToPrimitive;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Username of the ordering user.
    pub usuario: String,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub producto_id: i64,
    pub cantidad: i64,
}

// -------------------------
// JSON mapping helpers
// -------------------------
//
// The wire field names (nombre/precio/pedido/...) are the original public
// contract of this API and are kept verbatim for client compatibility.

pub fn product_to_json(product: &Product, public_base_url: &str) -> serde_json::Value {
    json!({
        "id": product.id,
        "nombre": product.name,
        "descripcion": product.description,
        "tipo": product.category,
        "precio": money::display_2dp(product.price),
        "stock": product.stock,
        "condicion": product.condition,
        "imagen": product
            .image
            .as_deref()
            .map(|path| format!("{public_base_url}/media/{path}")),
    })
}

/// Shape returned by order creation.
pub fn order_to_json(placed: &PlacedOrder, username: &str) -> serde_json::Value {
    json!({
        "id": placed.order.id,
        "usuario": username,
        "estado": placed.order.status.as_str(),
        "total": money::display_2dp(placed.order.total),
        "fecha_pedido": placed.order.placed_at.to_rfc3339(),
        "detalles": placed.items.iter().map(|item| json!({
            "producto": item.product_name,
            "cantidad": item.quantity,
            "subtotal": money::display_2dp(item.subtotal),
        })).collect::<Vec<_>>(),
    })
}

/// Shape returned by the per-user order listing (numeric totals).
pub fn order_summary_to_json(placed: &PlacedOrder) -> serde_json::Value {
    json!({
        "id": placed.order.id,
        "date": placed.order.placed_at.to_rfc3339(),
        "total": placed.order.total.to_f64().unwrap_or(0.0),
        "status": placed.order.status.as_str(),
        "items": placed.items.iter().map(|item| json!({
            "productName": item.product_name,
            "quantity": item.quantity,
            "price": item.unit_price.to_f64().unwrap_or(0.0),
            "subtotal": item.subtotal.to_f64().unwrap_or(0.0),
        })).collect::<Vec<_>>(),
    })
}
