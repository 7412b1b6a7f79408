//! Commission rule resolution
//!
//! Candidates are fetched in a single store call, then the four tiers are
//! evaluated in order over that set. The first tier with a match wins; later
//! tiers are never consulted once an earlier one matched.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use core_kernel::{AgentId, CommissionRuleId, CourseId, Currency, Money, UniversityId};

use crate::error::CommissionError;
use crate::ports::RuleStore;
use crate::rule::{CommissionRule, RuleKind, RuleTier};

/// The enrollment being priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentContext {
    pub agent_id: AgentId,
    pub course_id: CourseId,
    pub university_id: UniversityId,
    /// Tuition or fee figure percentage rules are computed against
    pub base_amount: Money,
}

/// Outcome of resolving an enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub amount: Money,
    pub kind: Option<RuleKind>,
    pub value: Decimal,
    pub rule_id: Option<CommissionRuleId>,
    pub priority_used: Option<RuleTier>,
}

impl Resolution {
    /// The "no commission configured" outcome
    pub fn none(currency: Currency) -> Self {
        Self {
            amount: Money::zero(currency),
            kind: None,
            value: Decimal::ZERO,
            rule_id: None,
            priority_used: None,
        }
    }

    fn from_rule(rule: &CommissionRule, tier: RuleTier, base: &Money) -> Self {
        Self {
            amount: rule.compute(base),
            kind: Some(rule.kind),
            value: rule.value,
            rule_id: Some(rule.id),
            priority_used: Some(tier),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.rule_id.is_some()
    }
}

/// Picks the winning rule for `ctx` from `candidates`.
///
/// Inactive rules are skipped. Inside a tier the earliest-created rule wins,
/// with the id as a final tie-break so the choice never depends on input order.
pub fn select_rule<'a>(
    candidates: &'a [CommissionRule],
    ctx: &EnrollmentContext,
) -> Option<(&'a CommissionRule, RuleTier)> {
    RuleTier::ORDERED.iter().find_map(|tier| {
        candidates
            .iter()
            .filter(|rule| rule.active && tier.matches(rule, ctx))
            .min_by_key(|rule| (rule.created_at, rule.id))
            .map(|rule| (rule, *tier))
    })
}

/// Resolves the rule and owed amount for an enrollment
pub struct CommissionRuleResolver {
    rules: Arc<dyn RuleStore>,
}

impl CommissionRuleResolver {
    pub fn new(rules: Arc<dyn RuleStore>) -> Self {
        Self { rules }
    }

    /// Resolves the commission for an enrollment.
    ///
    /// No matching rule is not an error: the result carries a zero amount and
    /// no rule id.
    #[instrument(skip_all, fields(agent_id = %ctx.agent_id, course_id = %ctx.course_id))]
    pub async fn resolve(&self, ctx: &EnrollmentContext) -> Result<Resolution, CommissionError> {
        let candidates = self
            .rules
            .find_candidates(ctx.agent_id, ctx.university_id, ctx.course_id)
            .await?;

        let resolution = match select_rule(&candidates, ctx) {
            Some((rule, tier)) => {
                debug!(rule_id = %rule.id, %tier, "Commission rule matched");
                Resolution::from_rule(rule, tier, &ctx.base_amount)
            }
            None => {
                debug!(candidates = candidates.len(), "No commission rule matched");
                Resolution::none(ctx.base_amount.currency())
            }
        };

        Ok(resolution)
    }
}
