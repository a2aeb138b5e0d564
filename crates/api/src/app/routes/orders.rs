use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use tienda_core::ProductId;
use tienda_orders::RequestedLine;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    // Typed deserialization rejects malformed bodies (including a
    // non-numeric `cantidad`) before anything touches the store.
    let Ok(Json(body)) = payload else {
        return errors::invalid_body_response();
    };

    let user = match services.store.user_by_username(&body.usuario).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return errors::json_error(
                StatusCode::NOT_FOUND,
                format!("user {:?} not found", body.usuario),
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let requested: Vec<RequestedLine> = body
        .items
        .iter()
        .map(|item| RequestedLine {
            product_id: ProductId::new(item.producto_id),
            quantity: item.cantidad,
        })
        .collect();

    match services.store.place_order(user.id, &requested).await {
        Ok(placed) => (
            StatusCode::CREATED,
            Json(dto::order_to_json(&placed, &user.username)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_user_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> axum::response::Response {
    let user = match services.store.user_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return errors::json_error(
                StatusCode::NOT_FOUND,
                format!("user {username:?} not found"),
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    match services.store.orders_for_user(user.id).await {
        Ok(orders) => {
            let body: Vec<_> = orders.iter().map(dto::order_summary_to_json).collect();
            Json(body).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
