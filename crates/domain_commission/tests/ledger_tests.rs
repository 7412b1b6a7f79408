//! Commission Ledger Tests
//!
//! Exercises the resolver, ledger, earnings aggregator and rule catalog
//! together over the in-memory adapters.
//!
//! # Test Organization
//!
//! - `resolution` - tier precedence and amount computation
//! - `ledger_lifecycle` - create / approve / settle
//! - `earnings` - per-status sums
//! - `catalog` - rule administration and snapshot immutability
//! - `strict_mode` - per-agent locking around approval

use std::sync::Arc;

use core_kernel::{
    AgentId, ApplicationId, AuditSink, CourseId, Currency, MemoryAuditSink, Money, UniversityId,
    UserId,
};
use domain_commission::{
    CommissionError, CommissionLedger, CommissionRule, CommissionRuleResolver, CommissionStatus,
    EarningsAggregator, EnrollmentContext, InMemoryCommissionRecordStore, InMemoryRuleStore,
    LocalAgentLocks, NewCommission, NewRule, RuleCatalog, RuleKind, RuleScope, RuleStore,
    RuleTier,
};
use rust_decimal_macros::dec;

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct Harness {
    rules: Arc<InMemoryRuleStore>,
    records: Arc<InMemoryCommissionRecordStore>,
    audit: Arc<MemoryAuditSink>,
    ledger: Arc<CommissionLedger>,
    earnings: EarningsAggregator,
    catalog: RuleCatalog,
}

fn harness() -> Harness {
    let rules = Arc::new(InMemoryRuleStore::new());
    let records = Arc::new(InMemoryCommissionRecordStore::new());
    let audit = Arc::new(MemoryAuditSink::new());

    let ledger = Arc::new(CommissionLedger::new(
        records.clone(),
        CommissionRuleResolver::new(rules.clone()),
        audit.clone() as Arc<dyn AuditSink>,
        Currency::USD,
    ));
    let earnings = EarningsAggregator::new(ledger.clone());
    let catalog = RuleCatalog::new(rules.clone(), audit.clone());

    Harness {
        rules,
        records,
        audit,
        ledger,
        earnings,
        catalog,
    }
}

struct Enrollment {
    agent: AgentId,
    course: CourseId,
    university: UniversityId,
}

impl Enrollment {
    fn new() -> Self {
        Self {
            agent: AgentId::new(),
            course: CourseId::new(),
            university: UniversityId::new(),
        }
    }

    fn context(&self, base: rust_decimal::Decimal) -> EnrollmentContext {
        EnrollmentContext {
            agent_id: self.agent,
            course_id: self.course,
            university_id: self.university,
            base_amount: Money::new(base, Currency::USD),
        }
    }

    fn commission(&self, base: rust_decimal::Decimal) -> NewCommission {
        NewCommission {
            application_id: ApplicationId::new(),
            agent_id: self.agent,
            course_id: self.course,
            university_id: self.university,
            base_amount: Money::new(base, Currency::USD),
        }
    }
}

async fn add_rule(h: &Harness, rule: CommissionRule) -> CommissionRule {
    h.rules.insert_rule(&rule).await.unwrap();
    rule
}

// ============================================================================
// RESOLUTION
// ============================================================================

mod resolution {
    use super::*;

    #[tokio::test]
    async fn percentage_rule_computes_rounded_amount() {
        let h = harness();
        let e = Enrollment::new();
        add_rule(&h, CommissionRule::percentage(RuleScope::course_default(e.course), dec!(15)).unwrap()).await;

        let resolver = CommissionRuleResolver::new(h.rules.clone());
        let resolution = resolver.resolve(&e.context(dec!(1000))).await.unwrap();

        assert_eq!(resolution.amount.amount(), dec!(150.00));
        assert_eq!(resolution.kind, Some(RuleKind::Percentage));
        assert_eq!(resolution.priority_used, Some(RuleTier::CourseDefault));
    }

    #[tokio::test]
    async fn percentage_rounds_half_up() {
        let h = harness();
        let e = Enrollment::new();
        add_rule(&h, CommissionRule::percentage(RuleScope::course_default(e.course), dec!(12.5)).unwrap()).await;

        let resolver = CommissionRuleResolver::new(h.rules.clone());
        // 12.5% of 0.99 = 0.12375 -> 0.12; of 1.00 = 0.125 -> 0.13
        assert_eq!(resolver.resolve(&e.context(dec!(0.99))).await.unwrap().amount.amount(), dec!(0.12));
        assert_eq!(resolver.resolve(&e.context(dec!(1.00))).await.unwrap().amount.amount(), dec!(0.13));
    }

    #[tokio::test]
    async fn flat_rule_ignores_base() {
        let h = harness();
        let e = Enrollment::new();
        add_rule(&h, CommissionRule::flat(RuleScope::agent_university(e.agent, e.university), dec!(2000)).unwrap()).await;

        let resolver = CommissionRuleResolver::new(h.rules.clone());
        for base in [dec!(0), dec!(10), dec!(99999)] {
            let r = resolver.resolve(&e.context(base)).await.unwrap();
            assert_eq!(r.amount.amount(), dec!(2000));
            assert_eq!(r.priority_used, Some(RuleTier::AgentUniversity));
        }
    }

    #[tokio::test]
    async fn no_match_is_zero_not_error() {
        let h = harness();
        let e = Enrollment::new();
        // a rule for some other university
        add_rule(&h, CommissionRule::flat(RuleScope::university_default(UniversityId::new()), dec!(500)).unwrap()).await;

        let resolver = CommissionRuleResolver::new(h.rules.clone());
        let r = resolver.resolve(&e.context(dec!(1000))).await.unwrap();
        assert!(r.amount.is_zero());
        assert_eq!(r.rule_id, None);
        assert_eq!(r.kind, None);
        assert_eq!(r.priority_used, None);
    }

    #[tokio::test]
    async fn higher_tier_wins_across_all_four() {
        let h = harness();
        let e = Enrollment::new();
        add_rule(&h, CommissionRule::flat(RuleScope::university_default(e.university), dec!(4)).unwrap()).await;
        add_rule(&h, CommissionRule::flat(RuleScope::course_default(e.course), dec!(3)).unwrap()).await;
        add_rule(&h, CommissionRule::flat(RuleScope::agent_university(e.agent, e.university), dec!(2)).unwrap()).await;
        let top = add_rule(&h, CommissionRule::flat(RuleScope::agent_course(e.agent, e.course), dec!(1)).unwrap()).await;

        let resolver = CommissionRuleResolver::new(h.rules.clone());
        let r = resolver.resolve(&e.context(dec!(1000))).await.unwrap();
        assert_eq!(r.rule_id, Some(top.id));
        assert_eq!(r.amount.amount(), dec!(1));
    }
}

// ============================================================================
// LEDGER LIFECYCLE
// ============================================================================

mod ledger_lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_records_pending_snapshot() {
        let h = harness();
        let e = Enrollment::new();
        let rule = add_rule(&h, CommissionRule::flat(RuleScope::university_default(e.university), dec!(500)).unwrap()).await;

        let record = h.ledger.create(e.commission(dec!(12000))).await.unwrap();
        assert_eq!(record.status, CommissionStatus::Pending);
        assert_eq!(record.amount.amount(), dec!(500));
        assert_eq!(record.base_amount.amount(), dec!(12000));
        assert_eq!(record.rule_id, Some(rule.id));
        assert_eq!(record.priority_used, Some(RuleTier::UniversityDefault));
        // creation is not audited
        assert!(h.audit.entries().await.is_empty());
    }

    #[tokio::test]
    async fn create_without_rule_records_zero() {
        let h = harness();
        let e = Enrollment::new();
        let record = h.ledger.create(e.commission(dec!(12000))).await.unwrap();
        assert!(record.amount.is_zero());
        assert_eq!(record.rule_id, None);
    }

    #[tokio::test]
    async fn duplicate_application_rejected() {
        let h = harness();
        let e = Enrollment::new();
        let input = e.commission(dec!(1000));

        let first = h.ledger.create(input).await.unwrap();
        let err = h.ledger.create(input).await.unwrap_err();
        assert!(matches!(err, CommissionError::DuplicateRecord { .. }));

        let stored = h.ledger.find_by_application(input.application_id).await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert_eq!(h.records.len().await, 1);
    }

    #[tokio::test]
    async fn negative_base_rejected() {
        let h = harness();
        let err = h.ledger.create(Enrollment::new().commission(dec!(-1))).await.unwrap_err();
        assert!(matches!(err, CommissionError::InvalidAmount(_)));
        assert!(h.records.is_empty().await);
    }

    #[tokio::test]
    async fn foreign_currency_rejected_and_earnings_intact() {
        let h = harness();
        let e = Enrollment::new();
        add_rule(&h, CommissionRule::flat(RuleScope::university_default(e.university), dec!(500)).unwrap()).await;
        let usd = h.ledger.create(e.commission(dec!(10000))).await.unwrap();
        h.ledger.approve(usd.id, UserId::new()).await.unwrap();

        let mut eur = e.commission(dec!(1000));
        eur.base_amount = Money::new(dec!(1000), Currency::EUR);
        let err = h.ledger.create(eur).await.unwrap_err();
        assert!(matches!(err, CommissionError::InvalidAmount(_)));
        assert_eq!(h.records.len().await, 1);

        let s = h.earnings.summarize(e.agent).await.unwrap();
        assert_eq!(s.approved.amount(), dec!(500));
        assert_eq!(s.total, s.approved);
    }

    #[tokio::test]
    async fn sub_cent_base_rejected() {
        let h = harness();
        let err = h.ledger.create(Enrollment::new().commission(dec!(1000.125))).await.unwrap_err();
        assert!(matches!(err, CommissionError::InvalidAmount(_)));
        assert!(h.records.is_empty().await);
    }

    #[tokio::test]
    async fn approve_stamps_and_audits() {
        let h = harness();
        let record = h.ledger.create(Enrollment::new().commission(dec!(1000))).await.unwrap();
        let admin = UserId::new();

        let approved = h.ledger.approve(record.id, admin).await.unwrap();
        assert_eq!(approved.status, CommissionStatus::Approved);
        assert_eq!(approved.approved_by, Some(admin));
        assert!(approved.approved_at.is_some());
        assert_eq!(h.audit.actions().await, vec!["commission.approve"]);
    }

    #[tokio::test]
    async fn approve_twice_fails_and_leaves_record() {
        let h = harness();
        let record = h.ledger.create(Enrollment::new().commission(dec!(1000))).await.unwrap();
        let first_admin = UserId::new();
        let approved = h.ledger.approve(record.id, first_admin).await.unwrap();

        let err = h.ledger.approve(record.id, UserId::new()).await.unwrap_err();
        assert!(matches!(err, CommissionError::InvalidTransition { .. }));
        assert_eq!(h.ledger.get(record.id).await.unwrap(), approved);
    }

    #[tokio::test]
    async fn approve_paid_fails() {
        let h = harness();
        let e = Enrollment::new();
        let record = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        h.ledger.approve(record.id, UserId::new()).await.unwrap();
        assert_eq!(h.ledger.mark_paid_for_agent(e.agent).await.unwrap(), 1);

        let err = h.ledger.approve(record.id, UserId::new()).await.unwrap_err();
        assert!(matches!(err, CommissionError::InvalidTransition { .. }));
        assert_eq!(h.ledger.get(record.id).await.unwrap().status, CommissionStatus::Paid);
    }

    #[tokio::test]
    async fn approve_missing_record_is_not_found() {
        let h = harness();
        let err = h
            .ledger
            .approve(core_kernel::CommissionRecordId::new(), UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CommissionError::RecordNotFound(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn mark_paid_is_idempotent_and_skips_pending() {
        let h = harness();
        let e = Enrollment::new();
        let a = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        let b = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        h.ledger.approve(a.id, UserId::new()).await.unwrap();

        assert_eq!(h.ledger.mark_paid_for_agent(e.agent).await.unwrap(), 1);
        assert_eq!(h.ledger.mark_paid_for_agent(e.agent).await.unwrap(), 0);

        let paid = h.ledger.get(a.id).await.unwrap();
        assert_eq!(paid.status, CommissionStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(h.ledger.get(b.id).await.unwrap().status, CommissionStatus::Pending);
    }

    #[tokio::test]
    async fn list_by_agent_filters_status() {
        let h = harness();
        let e = Enrollment::new();
        let a = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        h.ledger.create(Enrollment::new().commission(dec!(1000))).await.unwrap();
        h.ledger.approve(a.id, UserId::new()).await.unwrap();

        assert_eq!(h.ledger.list_by_agent(e.agent, None).await.unwrap().len(), 2);
        let approved = h
            .ledger
            .list_by_agent(e.agent, Some(CommissionStatus::Approved))
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, a.id);
    }
}

// ============================================================================
// EARNINGS
// ============================================================================

mod earnings {
    use super::*;

    #[tokio::test]
    async fn summary_tracks_ledger() {
        let h = harness();
        let e = Enrollment::new();
        add_rule(&h, CommissionRule::percentage(RuleScope::course_default(e.course), dec!(10)).unwrap()).await;

        let a = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        let b = h.ledger.create(e.commission(dec!(2000))).await.unwrap();
        h.ledger.create(e.commission(dec!(3000))).await.unwrap();
        h.ledger.approve(a.id, UserId::new()).await.unwrap();
        h.ledger.approve(b.id, UserId::new()).await.unwrap();
        h.ledger.mark_paid_for_agent(e.agent).await.unwrap();

        let c = h.ledger.create(e.commission(dec!(4000))).await.unwrap();
        h.ledger.approve(c.id, UserId::new()).await.unwrap();

        let s = h.earnings.summarize(e.agent).await.unwrap();
        assert_eq!(s.paid.amount(), dec!(300));
        assert_eq!(s.approved.amount(), dec!(400));
        assert_eq!(s.pending.amount(), dec!(300));
        assert_eq!(s.total.amount(), dec!(1000));
        assert_eq!(s.record_count, 4);
        assert_eq!(h.earnings.approved_balance(e.agent).await.unwrap().amount(), dec!(400));
    }

    #[tokio::test]
    async fn unknown_agent_has_zero_earnings() {
        let h = harness();
        let s = h.earnings.summarize(AgentId::new()).await.unwrap();
        assert!(s.total.is_zero());
        assert_eq!(s.currency, Currency::USD);
    }
}

// ============================================================================
// CATALOG
// ============================================================================

mod catalog {
    use super::*;
    use domain_commission::RuleFilter;

    fn new_rule(scope: RuleScope, kind: RuleKind, value: rust_decimal::Decimal) -> NewRule {
        NewRule {
            scope,
            kind,
            value,
            description: Some("intake 2026".to_string()),
        }
    }

    #[tokio::test]
    async fn repricing_does_not_touch_existing_records() {
        let h = harness();
        let e = Enrollment::new();
        let admin = UserId::new();
        let rule = h
            .catalog
            .create(new_rule(RuleScope::course_default(e.course), RuleKind::Percentage, dec!(10)), admin)
            .await
            .unwrap();

        let before = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        h.catalog
            .update_pricing(rule.id, RuleKind::Flat, dec!(50), admin)
            .await
            .unwrap();
        let after = h.ledger.create(e.commission(dec!(1000))).await.unwrap();

        assert_eq!(h.ledger.get(before.id).await.unwrap().amount.amount(), dec!(100));
        assert_eq!(h.ledger.get(before.id).await.unwrap().kind, Some(RuleKind::Percentage));
        assert_eq!(after.amount.amount(), dec!(50));
        assert_eq!(
            h.audit.actions().await,
            vec!["rule.create", "rule.update_pricing"]
        );
    }

    #[tokio::test]
    async fn deactivated_rule_falls_through_to_next_tier() {
        let h = harness();
        let e = Enrollment::new();
        let admin = UserId::new();
        let course_rule = h
            .catalog
            .create(new_rule(RuleScope::course_default(e.course), RuleKind::Flat, dec!(700)), admin)
            .await
            .unwrap();
        h.catalog
            .create(new_rule(RuleScope::university_default(e.university), RuleKind::Flat, dec!(500)), admin)
            .await
            .unwrap();

        let deactivated = h.catalog.deactivate(course_rule.id, admin).await.unwrap();
        assert!(!deactivated.active);

        let record = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        assert_eq!(record.amount.amount(), dec!(500));
        assert_eq!(record.priority_used, Some(RuleTier::UniversityDefault));

        h.catalog.activate(course_rule.id, admin).await.unwrap();
        let record = h.ledger.create(e.commission(dec!(1000))).await.unwrap();
        assert_eq!(record.amount.amount(), dec!(700));
    }

    #[tokio::test]
    async fn invalid_rules_rejected() {
        let h = harness();
        let admin = UserId::new();
        let over = h
            .catalog
            .create(new_rule(RuleScope::course_default(CourseId::new()), RuleKind::Percentage, dec!(150)), admin)
            .await;
        assert!(matches!(over, Err(CommissionError::InvalidRule(_))));

        let unscoped = h
            .catalog
            .create(new_rule(RuleScope::default(), RuleKind::Flat, dec!(10)), admin)
            .await;
        assert!(matches!(unscoped, Err(CommissionError::InvalidRule(_))));
        assert!(h.catalog.list(RuleFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_rule_is_not_found() {
        let h = harness();
        let err = h
            .catalog
            .deactivate(core_kernel::CommissionRuleId::new(), UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CommissionError::RuleNotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_agent() {
        let h = harness();
        let e = Enrollment::new();
        let admin = UserId::new();
        h.catalog
            .create(new_rule(RuleScope::agent_course(e.agent, e.course), RuleKind::Flat, dec!(1)), admin)
            .await
            .unwrap();
        h.catalog
            .create(new_rule(RuleScope::course_default(e.course), RuleKind::Flat, dec!(2)), admin)
            .await
            .unwrap();

        let mine = h.catalog.list(RuleFilter::for_agent(e.agent)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].priority, RuleTier::AgentCourse);
        assert_eq!(h.catalog.list(RuleFilter::active_only()).await.unwrap().len(), 2);
    }
}

// ============================================================================
// STRICT MODE
// ============================================================================

mod strict_mode {
    use super::*;

    #[tokio::test]
    async fn concurrent_approvals_only_one_succeeds() {
        let h = harness();
        let record = h.ledger.create(Enrollment::new().commission(dec!(1000))).await.unwrap();

        let strict = Arc::new(
            CommissionLedger::new(
                h.records.clone(),
                CommissionRuleResolver::new(h.rules.clone()),
                h.audit.clone(),
                Currency::USD,
            )
            .with_agent_locks(Arc::new(LocalAgentLocks::new())),
        );

        let (a, b) = tokio::join!(
            strict.approve(record.id, UserId::new()),
            strict.approve(record.id, UserId::new())
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(h.audit.actions().await, vec!["commission.approve"]);
    }
}
