//! Property tests for rule precedence and the earnings sum law

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{AgentId, ApplicationId, CourseId, Currency, Money, UniversityId, UserId};
use domain_commission::{
    select_rule, CommissionRecord, CommissionRule, EarningsSummary, EnrollmentContext, Resolution,
    RuleScope, RuleTier,
};

/// Which identifiers a generated rule uses: the enrollment's own or a foreign one
#[derive(Debug, Clone)]
struct RuleShape {
    tier: RuleTier,
    own_agent: bool,
    own_target: bool,
    active: bool,
    age_secs: i64,
}

fn rule_shape() -> impl Strategy<Value = RuleShape> {
    (
        prop::sample::select(RuleTier::ORDERED.to_vec()),
        any::<bool>(),
        any::<bool>(),
        prop::bool::weighted(0.8),
        0i64..10_000,
    )
        .prop_map(|(tier, own_agent, own_target, active, age_secs)| RuleShape {
            tier,
            own_agent,
            own_target,
            active,
            age_secs,
        })
}

fn build(shape: &RuleShape, ctx: &EnrollmentContext) -> CommissionRule {
    let agent = if shape.own_agent { ctx.agent_id } else { AgentId::new() };
    let course = if shape.own_target { ctx.course_id } else { CourseId::new() };
    let university = if shape.own_target { ctx.university_id } else { UniversityId::new() };

    let scope = match shape.tier {
        RuleTier::AgentCourse => RuleScope::agent_course(agent, course),
        RuleTier::AgentUniversity => RuleScope::agent_university(agent, university),
        RuleTier::CourseDefault => RuleScope::course_default(course),
        RuleTier::UniversityDefault => RuleScope::university_default(university),
    };
    let mut rule = CommissionRule::flat(scope, Decimal::ONE).unwrap();
    rule.created_at = Utc::now() - Duration::seconds(shape.age_secs);
    rule.active = shape.active;
    rule
}

/// Brute-force reference: does `rule` apply to `ctx` at its own tier?
fn applies(rule: &CommissionRule, ctx: &EnrollmentContext) -> bool {
    rule.active && rule.priority.matches(rule, ctx)
}

fn context() -> EnrollmentContext {
    EnrollmentContext {
        agent_id: AgentId::new(),
        course_id: CourseId::new(),
        university_id: UniversityId::new(),
        base_amount: Money::new(Decimal::new(100_000, 2), Currency::USD),
    }
}

proptest! {
    #[test]
    fn selected_rule_has_lowest_matching_tier(shapes in prop::collection::vec(rule_shape(), 0..24)) {
        let ctx = context();
        let rules: Vec<CommissionRule> = shapes.iter().map(|s| build(s, &ctx)).collect();

        let best_tier = rules.iter().filter(|r| applies(r, &ctx)).map(|r| r.priority).min();

        match select_rule(&rules, &ctx) {
            None => prop_assert!(best_tier.is_none()),
            Some((rule, tier)) => {
                prop_assert_eq!(Some(tier), best_tier);
                prop_assert_eq!(rule.priority, tier);
                prop_assert!(rule.active);

                // earliest-created among its tier
                let earliest = rules
                    .iter()
                    .filter(|r| applies(r, &ctx) && r.priority == tier)
                    .map(|r| (r.created_at, r.id))
                    .min();
                prop_assert_eq!(Some((rule.created_at, rule.id)), earliest);
            }
        }
    }

    #[test]
    fn selection_ignores_input_order(shapes in prop::collection::vec(rule_shape(), 1..16)) {
        let ctx = context();
        let rules: Vec<CommissionRule> = shapes.iter().map(|s| build(s, &ctx)).collect();
        let mut reversed = rules.clone();
        reversed.reverse();

        let forward = select_rule(&rules, &ctx).map(|(r, _)| r.id);
        let backward = select_rule(&reversed, &ctx).map(|(r, _)| r.id);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn total_equals_sum_of_buckets(
        entries in prop::collection::vec((0i64..10_000_000i64, 0u8..3u8), 0..40)
    ) {
        let agent = AgentId::new();
        let records: Vec<CommissionRecord> = entries
            .iter()
            .map(|(minor, stage)| {
                let amount = Money::from_minor(*minor, Currency::USD);
                let ctx = EnrollmentContext {
                    agent_id: agent,
                    course_id: CourseId::new(),
                    university_id: UniversityId::new(),
                    base_amount: amount,
                };
                let mut resolution = Resolution::none(Currency::USD);
                resolution.amount = amount;
                let mut record = CommissionRecord::pending(ApplicationId::new(), &ctx, resolution);
                if *stage >= 1 {
                    record.approve(UserId::new()).unwrap();
                }
                if *stage >= 2 {
                    record.settle(Utc::now()).unwrap();
                }
                record
            })
            .collect();

        let s = EarningsSummary::from_records(agent, Currency::USD, &records).unwrap();
        let recomputed = s
            .pending
            .checked_add(&s.approved)
            .and_then(|m| m.checked_add(&s.paid))
            .unwrap();
        prop_assert_eq!(s.total, recomputed);
        prop_assert_eq!(s.record_count, records.len());

        let expected: i64 = entries.iter().map(|(m, _)| *m).sum();
        prop_assert_eq!(s.total, Money::from_minor(expected, Currency::USD));
    }
}
