//! Commission rule definitions
//!
//! A rule prices commissions for a scope (agent / university / course). The
//! precedence tier is derived from the scope when the rule is built, so the
//! stored priority can never disagree with what the rule actually matches.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AgentId, CommissionRuleId, CourseId, Money, Rate, UniversityId};

use crate::error::CommissionError;
use crate::resolver::EnrollmentContext;

/// Decimal places commission amounts are rounded to
pub const COMMISSION_DECIMAL_PLACES: u32 = 2;

/// Most decimal places a percentage may carry
pub const PERCENTAGE_DECIMAL_PLACES: u32 = 4;

/// How a rule prices a commission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// `value` is a percentage of the base amount
    Percentage,
    /// `value` is a fixed amount, independent of the base
    Flat,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Percentage => "percentage",
            RuleKind::Flat => "flat",
        }
    }

    /// Computes the owed amount for `value` against `base`
    pub fn compute(&self, value: Decimal, base: &Money) -> Money {
        match self {
            RuleKind::Percentage => {
                Rate::from_percentage(value).apply_rounded(base, COMMISSION_DECIMAL_PLACES)
            }
            RuleKind::Flat => Money::new(value, base.currency()),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = CommissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(RuleKind::Percentage),
            "flat" => Ok(RuleKind::Flat),
            other => Err(CommissionError::invalid_rule(format!("unknown rule kind '{}'", other))),
        }
    }
}

/// Fixed precedence tiers; a lower priority number wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    AgentCourse,
    AgentUniversity,
    CourseDefault,
    UniversityDefault,
}

impl RuleTier {
    /// Tiers in evaluation order
    pub const ORDERED: [RuleTier; 4] = [
        RuleTier::AgentCourse,
        RuleTier::AgentUniversity,
        RuleTier::CourseDefault,
        RuleTier::UniversityDefault,
    ];

    pub fn priority(&self) -> i16 {
        match self {
            RuleTier::AgentCourse => 1,
            RuleTier::AgentUniversity => 2,
            RuleTier::CourseDefault => 3,
            RuleTier::UniversityDefault => 4,
        }
    }

    pub fn from_priority(priority: i16) -> Option<Self> {
        RuleTier::ORDERED
            .into_iter()
            .find(|tier| tier.priority() == priority)
    }

    /// Returns true if `rule`'s scope matches `ctx` at this tier.
    ///
    /// Activity is not considered here; callers filter inactive rules.
    pub fn matches(&self, rule: &CommissionRule, ctx: &EnrollmentContext) -> bool {
        match self {
            RuleTier::AgentCourse => {
                rule.agent_id == Some(ctx.agent_id) && rule.course_id == Some(ctx.course_id)
            }
            RuleTier::AgentUniversity => {
                rule.agent_id == Some(ctx.agent_id)
                    && rule.university_id == Some(ctx.university_id)
                    && rule.course_id.is_none()
            }
            RuleTier::CourseDefault => {
                rule.agent_id.is_none() && rule.course_id == Some(ctx.course_id)
            }
            RuleTier::UniversityDefault => {
                rule.agent_id.is_none()
                    && rule.course_id.is_none()
                    && rule.university_id == Some(ctx.university_id)
            }
        }
    }
}

impl fmt::Display for RuleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RuleTier::AgentCourse => "agent+course",
            RuleTier::AgentUniversity => "agent+university",
            RuleTier::CourseDefault => "course default",
            RuleTier::UniversityDefault => "university default",
        };
        write!(f, "{} (priority {})", label, self.priority())
    }
}

/// Who a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleScope {
    pub agent_id: Option<AgentId>,
    pub university_id: Option<UniversityId>,
    pub course_id: Option<CourseId>,
}

impl RuleScope {
    pub fn agent_course(agent_id: AgentId, course_id: CourseId) -> Self {
        Self {
            agent_id: Some(agent_id),
            university_id: None,
            course_id: Some(course_id),
        }
    }

    pub fn agent_university(agent_id: AgentId, university_id: UniversityId) -> Self {
        Self {
            agent_id: Some(agent_id),
            university_id: Some(university_id),
            course_id: None,
        }
    }

    pub fn course_default(course_id: CourseId) -> Self {
        Self {
            agent_id: None,
            university_id: None,
            course_id: Some(course_id),
        }
    }

    pub fn university_default(university_id: UniversityId) -> Self {
        Self {
            agent_id: None,
            university_id: Some(university_id),
            course_id: None,
        }
    }

    /// Sets the university on a course-scoped rule (informational only)
    pub fn at_university(mut self, university_id: UniversityId) -> Self {
        self.university_id = Some(university_id);
        self
    }

    /// Derives the precedence tier of this scope
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` when neither a university nor a course is set
    pub fn tier(&self) -> Result<RuleTier, CommissionError> {
        match (self.agent_id, self.university_id, self.course_id) {
            (_, None, None) => Err(CommissionError::invalid_rule(
                "a rule must be scoped to a university or a course",
            )),
            (Some(_), _, Some(_)) => Ok(RuleTier::AgentCourse),
            (Some(_), Some(_), None) => Ok(RuleTier::AgentUniversity),
            (None, _, Some(_)) => Ok(RuleTier::CourseDefault),
            (None, Some(_), None) => Ok(RuleTier::UniversityDefault),
        }
    }
}

/// A configured commission pricing policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: CommissionRuleId,
    pub agent_id: Option<AgentId>,
    pub university_id: Option<UniversityId>,
    pub course_id: Option<CourseId>,
    pub kind: RuleKind,
    /// Percentage (0-100) or fixed amount, depending on `kind`
    pub value: Decimal,
    pub priority: RuleTier,
    pub active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionRule {
    /// Creates a new active rule
    ///
    /// # Errors
    ///
    /// - `InvalidRule` if the scope has neither a university nor a course
    /// - `InvalidRule` if the value is negative, or a percentage above 100
    pub fn new(scope: RuleScope, kind: RuleKind, value: Decimal) -> Result<Self, CommissionError> {
        let priority = scope.tier()?;
        validate_pricing(kind, value)?;

        let now = Utc::now();
        Ok(Self {
            id: CommissionRuleId::new(),
            agent_id: scope.agent_id,
            university_id: scope.university_id,
            course_id: scope.course_id,
            kind,
            value,
            priority,
            active: true,
            description: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Shorthand for a percentage rule
    pub fn percentage(scope: RuleScope, percent: Decimal) -> Result<Self, CommissionError> {
        Self::new(scope, RuleKind::Percentage, percent)
    }

    /// Shorthand for a flat-amount rule
    pub fn flat(scope: RuleScope, amount: Decimal) -> Result<Self, CommissionError> {
        Self::new(scope, RuleKind::Flat, amount)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn scope(&self) -> RuleScope {
        RuleScope {
            agent_id: self.agent_id,
            university_id: self.university_id,
            course_id: self.course_id,
        }
    }

    /// Replaces the pricing of the rule.
    ///
    /// Existing commission records keep their snapshot; only future
    /// resolutions see the new pricing.
    pub fn reprice(&mut self, kind: RuleKind, value: Decimal) -> Result<(), CommissionError> {
        validate_pricing(kind, value)?;
        self.kind = kind;
        self.value = value;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    /// Computes the commission this rule yields on `base`
    pub fn compute(&self, base: &Money) -> Money {
        self.kind.compute(self.value, base)
    }

    /// Returns true if the rule is active and matches `ctx` at any tier
    pub fn is_candidate_for(&self, ctx: &EnrollmentContext) -> bool {
        self.active && RuleTier::ORDERED.iter().any(|tier| tier.matches(self, ctx))
    }
}

fn validate_pricing(kind: RuleKind, value: Decimal) -> Result<(), CommissionError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CommissionError::invalid_rule(format!(
            "commission value must not be negative, got {}",
            value
        )));
    }
    if kind == RuleKind::Percentage && value > dec!(100) {
        return Err(CommissionError::invalid_rule(format!(
            "percentage must be between 0 and 100, got {}",
            value
        )));
    }
    let places = match kind {
        RuleKind::Percentage => PERCENTAGE_DECIMAL_PLACES,
        RuleKind::Flat => COMMISSION_DECIMAL_PLACES,
    };
    if value.normalize().scale() > places {
        return Err(CommissionError::invalid_rule(format!(
            "{} value {} has more than {} decimal places",
            kind, value, places
        )));
    }
    Ok(())
}
