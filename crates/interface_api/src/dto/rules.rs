//! Commission rule DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_commission::{CommissionRule, NewRule, RuleFilter, RuleKind, RuleScope, RuleTier};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRuleRequest {
    pub agent_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub kind: RuleKind,
    pub value: Decimal,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl From<CreateRuleRequest> for NewRule {
    fn from(request: CreateRuleRequest) -> Self {
        NewRule {
            scope: RuleScope {
                agent_id: request.agent_id.map(Into::into),
                university_id: request.university_id.map(Into::into),
                course_id: request.course_id.map(Into::into),
            },
            kind: request.kind,
            value: request.value,
            description: request.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePricingRequest {
    pub kind: RuleKind,
    pub value: Decimal,
}

/// Query string for `GET /rules`
#[derive(Debug, Default, Deserialize)]
pub struct RuleQuery {
    pub agent_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    /// Tier number, 1 (agent+course) to 4 (university default)
    pub priority: Option<i16>,
    pub active: Option<bool>,
}

impl TryFrom<RuleQuery> for RuleFilter {
    type Error = ApiError;

    fn try_from(query: RuleQuery) -> Result<Self, Self::Error> {
        let priority = query
            .priority
            .map(|p| {
                RuleTier::from_priority(p)
                    .ok_or_else(|| ApiError::BadRequest(format!("priority must be 1-4, got {p}")))
            })
            .transpose()?;

        Ok(RuleFilter {
            agent_id: query.agent_id.map(Into::into),
            university_id: query.university_id.map(Into::into),
            course_id: query.course_id.map(Into::into),
            priority,
            active: query.active,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleResponse {
    pub id: Uuid,
    pub agent_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub kind: RuleKind,
    pub value: Decimal,
    pub priority: i16,
    pub tier: RuleTier,
    pub active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommissionRule> for RuleResponse {
    fn from(rule: CommissionRule) -> Self {
        Self {
            id: rule.id.into(),
            agent_id: rule.agent_id.map(Into::into),
            university_id: rule.university_id.map(Into::into),
            course_id: rule.course_id.map(Into::into),
            kind: rule.kind,
            value: rule.value,
            priority: rule.priority.priority(),
            tier: rule.priority,
            active: rule.active,
            description: rule.description,
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}
