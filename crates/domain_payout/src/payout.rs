//! Payout request aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AgentId, Money, PayoutId, UserId};

use crate::error::PayoutError;

/// Payout status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Submitted by the agent, awaiting an administrator
    Requested,
    /// Approved; the agent's approved commissions have been settled
    Approved,
    /// Refused by an administrator (terminal)
    Rejected,
    /// Funds transferred (terminal)
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Requested => "requested",
            PayoutStatus::Approved => "approved",
            PayoutStatus::Rejected => "rejected",
            PayoutStatus::Paid => "paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Rejected | PayoutStatus::Paid)
    }

    pub fn can_transition_to(&self, target: PayoutStatus) -> bool {
        use PayoutStatus::*;
        matches!(
            (*self, target),
            (Requested, Approved) | (Requested, Rejected) | (Approved, Paid)
        )
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(PayoutStatus::Requested),
            "approved" => Ok(PayoutStatus::Approved),
            "rejected" => Ok(PayoutStatus::Rejected),
            "paid" => Ok(PayoutStatus::Paid),
            other => Err(PayoutError::Validation(format!("unknown payout status '{}'", other))),
        }
    }
}

/// How the funds are transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Paypal,
    Wise,
    Cheque,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Wise => "wise",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "paypal" => Ok(PaymentMethod::Paypal),
            "wise" => Ok(PaymentMethod::Wise),
            "cheque" => Ok(PaymentMethod::Cheque),
            "other" => Ok(PaymentMethod::Other),
            other => Err(PayoutError::Validation(format!("unknown payment method '{}'", other))),
        }
    }
}

/// An agent's request to be paid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: PayoutId,
    /// Human-readable unique number, e.g. `PO-20260314093015123-1a2b3c4d`
    pub payout_number: String,
    pub agent_id: AgentId,
    pub amount: Money,
    pub status: PayoutStatus,
    /// Agent-supplied notes
    pub notes: Option<String>,
    /// Administrator notes, e.g. the rejection reason
    pub admin_notes: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Commission records swept to paid when this payout was approved
    pub settled_commissions: u64,
    pub requested_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutRequest {
    /// Creates a payout in `Requested` status
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless the amount is strictly positive and whole in
    /// the currency's minor unit
    pub fn new(agent_id: AgentId, amount: Money, notes: Option<String>) -> Result<Self, PayoutError> {
        if !amount.is_positive() {
            return Err(PayoutError::InvalidAmount(format!(
                "payout amount must be greater than zero, got {}",
                amount
            )));
        }
        if !amount.fits_minor_units() {
            return Err(PayoutError::InvalidAmount(format!(
                "payout amount {} has more decimal places than {} allows",
                amount.amount(),
                amount.currency()
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: PayoutId::new(),
            payout_number: generate_payout_number(agent_id, now),
            agent_id,
            amount,
            status: PayoutStatus::Requested,
            notes,
            admin_notes: None,
            payment_method: None,
            payment_reference: None,
            processed_by: None,
            processed_at: None,
            settled_commissions: 0,
            requested_at: now,
            paid_at: None,
            updated_at: now,
        })
    }

    pub fn approve(
        &mut self,
        processed_by: UserId,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
    ) -> Result<(), PayoutError> {
        self.transition(PayoutStatus::Approved, processed_by)?;
        self.payment_method = Some(payment_method);
        self.payment_reference = payment_reference;
        Ok(())
    }

    pub fn reject(&mut self, processed_by: UserId, notes: Option<String>) -> Result<(), PayoutError> {
        self.transition(PayoutStatus::Rejected, processed_by)?;
        self.admin_notes = notes;
        Ok(())
    }

    /// Records that the funds were actually transferred
    pub fn mark_paid(
        &mut self,
        processed_by: UserId,
        payment_reference: Option<String>,
    ) -> Result<(), PayoutError> {
        self.transition(PayoutStatus::Paid, processed_by)?;
        if payment_reference.is_some() {
            self.payment_reference = payment_reference;
        }
        self.paid_at = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, target: PayoutStatus, processed_by: UserId) -> Result<(), PayoutError> {
        if !self.status.can_transition_to(target) {
            return Err(PayoutError::invalid_transition(self.status, target));
        }
        let now = Utc::now();
        self.status = target;
        self.processed_by = Some(processed_by);
        self.processed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

/// Generates a payout number: `PO-<yyyyMMddHHmmssSSS>-<agent suffix>`.
///
/// The suffix is the last 8 hex digits of the agent id. Two requests by the
/// same agent within the same millisecond collide; the store's unique
/// constraint rejects the second.
pub fn generate_payout_number(agent_id: AgentId, at: DateTime<Utc>) -> String {
    format!("PO-{}-{}", at.format("%Y%m%d%H%M%S%3f"), agent_id.short())
}
