//! Commission record aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    AgentId, ApplicationId, CommissionRecordId, CommissionRuleId, CourseId, Money,
    UniversityId, UserId,
};

use crate::error::CommissionError;
use crate::resolver::{EnrollmentContext, Resolution};
use crate::rule::{RuleKind, RuleTier};

/// Commission record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Priced and waiting for an administrator
    Pending,
    /// Approved and counted towards the agent's payable balance
    Approved,
    /// Settled by a payout
    Paid,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Approved => "approved",
            CommissionStatus::Paid => "paid",
        }
    }

    /// Forward-only: pending -> approved -> paid
    pub fn can_transition_to(&self, target: CommissionStatus) -> bool {
        use CommissionStatus::*;
        matches!((*self, target), (Pending, Approved) | (Approved, Paid))
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionStatus {
    type Err = CommissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommissionStatus::Pending),
            "approved" => Ok(CommissionStatus::Approved),
            "paid" => Ok(CommissionStatus::Paid),
            other => Err(CommissionError::Validation(format!(
                "unknown commission status '{}'",
                other
            ))),
        }
    }
}

/// The priced obligation created for one application
///
/// The pricing snapshot (`base_amount`, `amount`, `kind`, `value`,
/// `priority_used`) is captured at creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: CommissionRecordId,
    pub application_id: ApplicationId,
    pub agent_id: AgentId,
    pub course_id: CourseId,
    pub university_id: UniversityId,
    /// Rule that priced the record, `None` when nothing matched
    pub rule_id: Option<CommissionRuleId>,
    pub base_amount: Money,
    pub amount: Money,
    pub kind: Option<RuleKind>,
    pub value: Decimal,
    pub priority_used: Option<RuleTier>,
    pub status: CommissionStatus,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionRecord {
    /// Creates a pending record from a resolution
    pub fn pending(
        application_id: ApplicationId,
        ctx: &EnrollmentContext,
        resolution: Resolution,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CommissionRecordId::new(),
            application_id,
            agent_id: ctx.agent_id,
            course_id: ctx.course_id,
            university_id: ctx.university_id,
            rule_id: resolution.rule_id,
            base_amount: ctx.base_amount,
            amount: resolution.amount,
            kind: resolution.kind,
            value: resolution.value,
            priority_used: resolution.priority_used,
            status: CommissionStatus::Pending,
            approved_by: None,
            approved_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the record from pending to approved, stamping the approver
    pub fn approve(&mut self, approved_by: UserId) -> Result<(), CommissionError> {
        self.transition(CommissionStatus::Approved)?;
        self.approved_by = Some(approved_by);
        self.approved_at = Some(self.updated_at);
        Ok(())
    }

    /// Moves the record from approved to paid
    pub fn settle(&mut self, paid_at: DateTime<Utc>) -> Result<(), CommissionError> {
        self.transition(CommissionStatus::Paid)?;
        self.paid_at = Some(paid_at);
        self.updated_at = paid_at;
        Ok(())
    }

    pub fn is_settled(&self) -> bool {
        self.status == CommissionStatus::Paid
    }

    fn transition(&mut self, target: CommissionStatus) -> Result<(), CommissionError> {
        if !self.status.can_transition_to(target) {
            return Err(CommissionError::invalid_transition(self.status, target));
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}
