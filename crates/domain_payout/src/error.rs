//! Payout domain errors

use thiserror::Error;

use core_kernel::{Money, MoneyError, PortError};
use domain_commission::CommissionError;

/// Errors that can occur in the payout domain
#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("Payout not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The request exceeds the agent's approved-but-unpaid commission
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Duplicate payout number: {0}")]
    DuplicatePayoutNumber(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Commission(#[from] CommissionError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl PayoutError {
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        PayoutError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
