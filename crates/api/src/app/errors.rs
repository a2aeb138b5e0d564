use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tienda_core::DomainError;
use tienda_store::StoreError;

/// Uniform error body: `{"error": <message>}`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

/// Map a domain error to its HTTP response.
///
/// Messages are stable and taxonomy-keyed; raw internal detail never reaches
/// the client.
pub fn domain_error_to_response(err: &DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, msg.clone()),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, msg.clone()),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, msg.clone()),
        DomainError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "invalid credentials"),
        DomainError::InvariantViolation(msg) => {
            tracing::error!(error = %msg, "invariant violation");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(&e),
        StoreError::Database(e) => {
            tracing::error!(error = %e, "database failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

/// Rejection for payloads that fail typed deserialization (malformed JSON,
/// wrong field types such as a non-numeric quantity).
pub fn invalid_body_response() -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid request body")
}
