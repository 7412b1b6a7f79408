//! Commission domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};

/// Errors that can occur in the commission domain
#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("Commission rule not found: {0}")]
    RuleNotFound(String),

    #[error("Commission record not found: {0}")]
    RecordNotFound(String),

    /// A record already exists for the application; callers treat this as
    /// "already processed"
    #[error("Commission already recorded for application {application_id}")]
    DuplicateRecord { application_id: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid commission rule: {0}")]
    InvalidRule(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl CommissionError {
    /// Creates an InvalidRule error
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        CommissionError::InvalidRule(message.into())
    }

    /// Creates an InvalidTransition error from any two displayable states
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        CommissionError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns true for rule and record lookups that missed
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommissionError::RuleNotFound(_) | CommissionError::RecordNotFound(_)
        ) || matches!(self, CommissionError::Port(e) if e.is_not_found())
    }
}
