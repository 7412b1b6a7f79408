//! Request handlers
//!
//! Handlers authorize the caller, translate DTOs into service calls and map
//! results back. Business rules live in the domain services.

pub mod health;
pub mod rules;
pub mod commissions;
pub mod agents;
pub mod payouts;

use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// Runs the derive-based checks on a request body
pub(crate) fn validate_body<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate()
        .map_err(|errors| ApiError::Validation(errors.to_string()))
}

pub(crate) fn typed<T: From<Uuid>>(id: Uuid) -> T {
    T::from(id)
}
