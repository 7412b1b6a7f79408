//! API error handling
//!
//! Domain errors are mapped to status codes here. `DuplicateRecord`,
//! `InvalidTransition` and `InsufficientFunds` are client errors (400); the
//! insufficient-funds body carries the computed balance in `details`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_commission::CommissionError;
use domain_payout::PayoutError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Bad request: {message}")]
    BadRequestWithDetails { message: String, details: Vec<String> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::BadRequestWithDetails { message, details } => {
                (StatusCode::BAD_REQUEST, "bad_request", message, Some(details))
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
            ApiError::Internal(msg) => {
                error!(message = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg, None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

fn from_port(err: PortError) -> ApiError {
    match err {
        PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
        PortError::Validation { .. } => ApiError::Validation(err.to_string()),
        ref e if e.is_transient() => ApiError::Unavailable(err.to_string()),
        other => ApiError::Internal(other.to_string()),
    }
}

impl From<CommissionError> for ApiError {
    fn from(err: CommissionError) -> Self {
        match err {
            CommissionError::RuleNotFound(_) | CommissionError::RecordNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CommissionError::DuplicateRecord { .. }
            | CommissionError::InvalidTransition { .. }
            | CommissionError::InvalidAmount(_)
            | CommissionError::Money(_) => ApiError::BadRequest(err.to_string()),
            CommissionError::InvalidRule(_) | CommissionError::Validation(_) => {
                ApiError::Validation(err.to_string())
            }
            CommissionError::Port(port) => from_port(port),
        }
    }
}

impl From<PayoutError> for ApiError {
    fn from(err: PayoutError) -> Self {
        match err {
            PayoutError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PayoutError::InsufficientFunds { requested, available } => {
                ApiError::BadRequestWithDetails {
                    message: err.to_string(),
                    details: vec![
                        format!("requested: {}", requested.amount()),
                        format!("available: {}", available.amount()),
                        format!("currency: {}", available.currency()),
                    ],
                }
            }
            PayoutError::InvalidTransition { .. }
            | PayoutError::InvalidAmount(_)
            | PayoutError::Money(_) => ApiError::BadRequest(err.to_string()),
            PayoutError::DuplicatePayoutNumber(_) => ApiError::Conflict(err.to_string()),
            PayoutError::Validation(_) => ApiError::Validation(err.to_string()),
            PayoutError::Commission(inner) => inner.into(),
            PayoutError::Port(port) => from_port(port),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::TokenExpired => ApiError::Unauthorized,
            AuthError::MissingPermission(_) | AuthError::NotOwner => {
                ApiError::Forbidden(err.to_string())
            }
        }
    }
}
