//! Payout DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_payout::{PaymentMethod, PayoutRequest, PayoutStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePayoutRequest {
    /// Required for back-office callers; agents always request for themselves
    pub agent_id: Option<Uuid>,
    pub amount: Decimal,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApprovePayoutRequest {
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 120))]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectPayoutRequest {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MarkPaidRequest {
    #[validate(length(min = 1, max = 120))]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub id: Uuid,
    pub payout_number: String,
    pub agent_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
    pub status: PayoutStatus,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub settled_commissions: u64,
    pub requested_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<PayoutRequest> for PayoutResponse {
    fn from(payout: PayoutRequest) -> Self {
        Self {
            id: payout.id.into(),
            payout_number: payout.payout_number,
            agent_id: payout.agent_id.into(),
            currency: payout.amount.currency().code().to_string(),
            amount: payout.amount.amount(),
            status: payout.status,
            notes: payout.notes,
            admin_notes: payout.admin_notes,
            payment_method: payout.payment_method,
            payment_reference: payout.payment_reference,
            processed_by: payout.processed_by.map(Into::into),
            processed_at: payout.processed_at,
            settled_commissions: payout.settled_commissions,
            requested_at: payout.requested_at,
            paid_at: payout.paid_at,
        }
    }
}
