//! Test Data Builders
//!
//! Builder patterns for constructing rules and enrollments with sensible
//! defaults. Tests set only the fields they care about.

use chrono::{DateTime, Utc};
use core_kernel::{AgentId, ApplicationId, CourseId, Money, UniversityId};
use domain_commission::{
    CommissionRule, EnrollmentContext, NewCommission, NewRule, RuleKind, RuleScope,
};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::MoneyFixtures;

/// An agent enrolling students into one course at one university
#[derive(Debug, Clone, Copy)]
pub struct TestEnrollment {
    pub agent_id: AgentId,
    pub course_id: CourseId,
    pub university_id: UniversityId,
}

impl Default for TestEnrollment {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnrollment {
    /// Fresh random identifiers
    pub fn new() -> Self {
        Self {
            agent_id: AgentId::new(),
            course_id: CourseId::new(),
            university_id: UniversityId::new(),
        }
    }

    /// Same course and university, different agent
    pub fn for_other_agent(&self) -> Self {
        Self {
            agent_id: AgentId::new(),
            ..*self
        }
    }

    pub fn context(&self, base_amount: Money) -> EnrollmentContext {
        EnrollmentContext {
            agent_id: self.agent_id,
            course_id: self.course_id,
            university_id: self.university_id,
            base_amount,
        }
    }

    /// A commission input for a fresh application
    pub fn commission(&self, base_amount: Money) -> NewCommission {
        NewCommission {
            application_id: ApplicationId::new(),
            agent_id: self.agent_id,
            course_id: self.course_id,
            university_id: self.university_id,
            base_amount,
        }
    }

    /// A commission input priced against the standard tuition
    pub fn tuition_commission(&self) -> NewCommission {
        self.commission(MoneyFixtures::tuition_usd())
    }
}

/// Builder for commission rules
pub struct CommissionRuleBuilder {
    scope: RuleScope,
    kind: RuleKind,
    value: Decimal,
    active: bool,
    created_at: Option<DateTime<Utc>>,
    description: Option<String>,
}

impl CommissionRuleBuilder {
    /// Starts from a 10% rule on `scope`
    pub fn new(scope: RuleScope) -> Self {
        Self {
            scope,
            kind: RuleKind::Percentage,
            value: dec!(10),
            active: true,
            created_at: None,
            description: None,
        }
    }

    pub fn agent_course(e: &TestEnrollment) -> Self {
        Self::new(RuleScope::agent_course(e.agent_id, e.course_id))
    }

    pub fn agent_university(e: &TestEnrollment) -> Self {
        Self::new(RuleScope::agent_university(e.agent_id, e.university_id))
    }

    pub fn course_default(e: &TestEnrollment) -> Self {
        Self::new(RuleScope::course_default(e.course_id))
    }

    pub fn university_default(e: &TestEnrollment) -> Self {
        Self::new(RuleScope::university_default(e.university_id))
    }

    pub fn percentage(mut self, percent: Decimal) -> Self {
        self.kind = RuleKind::Percentage;
        self.value = percent;
        self
    }

    pub fn flat(mut self, amount: Decimal) -> Self {
        self.kind = RuleKind::Flat;
        self.value = amount;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Attaches a generated description
    pub fn with_random_description(mut self) -> Self {
        self.description = Some(Sentence(3..8).fake());
        self
    }

    /// Builds the rule
    ///
    /// # Panics
    ///
    /// Panics if the configured scope or pricing is invalid
    pub fn build(self) -> CommissionRule {
        let mut rule = CommissionRule::new(self.scope, self.kind, self.value)
            .expect("builder produced an invalid rule");
        rule.active = self.active;
        rule.description = self.description;
        if let Some(at) = self.created_at {
            rule.created_at = at;
            rule.updated_at = at;
        }
        rule
    }

    /// Builds the catalog input instead of a rule
    pub fn build_input(self) -> NewRule {
        NewRule {
            scope: self.scope,
            kind: self.kind,
            value: self.value,
            description: self.description,
        }
    }
}

/// Random payout note text
pub fn random_note() -> String {
    Sentence(2..6).fake()
}
