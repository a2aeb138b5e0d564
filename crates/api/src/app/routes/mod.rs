use axum::{Router, routing::get};

use crate::middleware::{self, AuthState};

pub mod auth;
pub mod orders;
pub mod products;
pub mod system;

/// Build the routing tree.
///
/// Catalog mutations are admin-gated; registration, login, the product list
/// and the order endpoints are open, matching the original public contract.
pub fn router(auth_state: AuthState) -> Router {
    let admin = Router::new()
        .route("/products/create", axum::routing::post(products::create_product))
        .route("/products/edit/:id", axum::routing::post(products::edit_product))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(system::health))
        .route("/register", axum::routing::post(auth::register))
        .route("/login", axum::routing::post(auth::login))
        .route("/products", get(products::list_products))
        .route("/orders/create", axum::routing::post(orders::create_order))
        .route("/orders/user/:username", get(orders::list_user_orders))
        .merge(admin)
}
