//! Commission record and earnings DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Currency, Money};
use domain_commission::{
    CommissionRecord, CommissionStatus, EarningsSummary, NewCommission, RuleKind, RuleTier,
};

use crate::error::ApiError;

/// Sent by the application workflow at the commission milestone
#[derive(Debug, Deserialize)]
pub struct CreateCommissionRequest {
    pub application_id: Uuid,
    pub agent_id: Uuid,
    pub course_id: Uuid,
    pub university_id: Uuid,
    pub base_amount: Decimal,
    /// Defaults to the configured booking currency; any other currency is
    /// refused by the ledger
    pub currency: Option<String>,
}

impl CreateCommissionRequest {
    pub fn into_input(self, default_currency: Currency) -> Result<NewCommission, ApiError> {
        let currency = match self.currency.as_deref() {
            Some(code) => code
                .parse()
                .map_err(|e| ApiError::BadRequest(format!("{e}")))?,
            None => default_currency,
        };

        Ok(NewCommission {
            application_id: self.application_id.into(),
            agent_id: self.agent_id.into(),
            course_id: self.course_id.into(),
            university_id: self.university_id.into(),
            base_amount: Money::new(self.base_amount, currency),
        })
    }
}

/// Query string for `GET /agents/:id/commissions`
#[derive(Debug, Default, Deserialize)]
pub struct CommissionListQuery {
    pub status: Option<CommissionStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub agent_id: Uuid,
    pub course_id: Uuid,
    pub university_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub currency: String,
    pub base_amount: Decimal,
    pub amount: Decimal,
    pub kind: Option<RuleKind>,
    pub value: Decimal,
    pub priority_used: Option<RuleTier>,
    pub status: CommissionStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CommissionRecord> for CommissionResponse {
    fn from(record: CommissionRecord) -> Self {
        Self {
            id: record.id.into(),
            application_id: record.application_id.into(),
            agent_id: record.agent_id.into(),
            course_id: record.course_id.into(),
            university_id: record.university_id.into(),
            rule_id: record.rule_id.map(Into::into),
            currency: record.amount.currency().code().to_string(),
            base_amount: record.base_amount.amount(),
            amount: record.amount.amount(),
            kind: record.kind,
            value: record.value,
            priority_used: record.priority_used,
            status: record.status,
            approved_by: record.approved_by.map(Into::into),
            approved_at: record.approved_at,
            paid_at: record.paid_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EarningsResponse {
    pub agent_id: Uuid,
    pub currency: String,
    pub total: Decimal,
    pub pending: Decimal,
    pub approved: Decimal,
    pub paid: Decimal,
    pub record_count: usize,
}

impl From<EarningsSummary> for EarningsResponse {
    fn from(summary: EarningsSummary) -> Self {
        Self {
            agent_id: summary.agent_id.into(),
            currency: summary.currency.code().to_string(),
            total: summary.total.amount(),
            pending: summary.pending.amount(),
            approved: summary.approved.amount(),
            paid: summary.paid.amount(),
            record_count: summary.record_count,
        }
    }
}
