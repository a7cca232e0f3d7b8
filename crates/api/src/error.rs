//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use credit_store::StoreError;
use domain::CreditError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Credit domain error.
    Credit(CreditError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Credit(err) => credit_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn credit_error_to_response(err: CreditError) -> (StatusCode, String) {
    match &err {
        CreditError::InvalidTenor(_) | CreditError::NonPositiveAdjustment(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        // The decline is already on the ledger; the status just reports it.
        CreditError::InsufficientCapacity { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        CreditError::Store(StoreError::LimitNotFound { .. })
        | CreditError::Store(StoreError::AssetNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CreditError::Store(_) => {
            tracing::error!(error = %err, "store error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        ApiError::Credit(err)
    }
}
