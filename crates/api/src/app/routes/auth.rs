use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use tienda_auth::{NewUser, password};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = payload else {
        return errors::invalid_body_response();
    };

    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    let new_user = match NewUser::validate(
        &body.username,
        &body.email,
        body.first_name.as_deref(),
        body.last_name.as_deref(),
        password_hash,
    ) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.store.create_user(new_user).await {
        Ok(user) => {
            tracing::info!(username = %user.username, "user registered");
            Json(serde_json::json!({ "message": "User registered successfully" }))
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = payload else {
        return errors::invalid_body_response();
    };

    let user = match services.store.user_by_identifier(&body.identifier).await {
        Ok(Some(user)) => user,
        // Unknown identifier and wrong password are indistinguishable to the
        // client.
        Ok(None) => return errors::json_error(StatusCode::UNAUTHORIZED, "invalid credentials"),
        Err(e) => return errors::store_error_to_response(e),
    };

    match password::verify_password(&user.password_hash, &body.password) {
        Ok(true) => {}
        Ok(false) => return errors::json_error(StatusCode::UNAUTHORIZED, "invalid credentials"),
        Err(e) => return errors::domain_error_to_response(&e),
    }

    let session = services.sessions.issue(user.id, &user.username, user.role);

    Json(serde_json::json!({
        "message": "Login successful",
        "userType": user.role.user_type(),
        "username": user.username,
        "token": session.token.to_string(),
    }))
    .into_response()
}
