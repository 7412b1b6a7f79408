//! Commission services wired over in-memory adapters

use std::sync::Arc;

use core_kernel::{Currency, MemoryAuditSink, UserId};
use domain_commission::{
    AgentLocks, CommissionLedger, CommissionRecord, CommissionRule, CommissionRuleResolver,
    EarningsAggregator, InMemoryCommissionRecordStore, InMemoryRuleStore, LocalAgentLocks,
    RuleCatalog, RuleStore,
};

use crate::builders::TestEnrollment;
use crate::fixtures::IdFixtures;

/// The commission side of the engine, backed by in-memory stores
pub struct CommissionHarness {
    pub rules: Arc<InMemoryRuleStore>,
    pub records: Arc<InMemoryCommissionRecordStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub locks: Option<Arc<LocalAgentLocks>>,
    pub ledger: Arc<CommissionLedger>,
    pub earnings: Arc<EarningsAggregator>,
    pub catalog: RuleCatalog,
}

impl CommissionHarness {
    /// Relaxed consistency, USD
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Strict consistency: the ledger serializes approvals per agent
    pub fn strict() -> Self {
        Self::build(Some(Arc::new(LocalAgentLocks::new())))
    }

    fn build(locks: Option<Arc<LocalAgentLocks>>) -> Self {
        let rules = Arc::new(InMemoryRuleStore::new());
        let records = Arc::new(InMemoryCommissionRecordStore::new());
        let audit = Arc::new(MemoryAuditSink::new());

        let mut ledger = CommissionLedger::new(
            records.clone(),
            CommissionRuleResolver::new(rules.clone()),
            audit.clone(),
            Currency::USD,
        );
        if let Some(locks) = &locks {
            ledger = ledger.with_agent_locks(locks.clone());
        }
        let ledger = Arc::new(ledger);
        let earnings = Arc::new(EarningsAggregator::new(ledger.clone()));
        let catalog = RuleCatalog::new(rules.clone(), audit.clone());

        Self {
            rules,
            records,
            audit,
            locks,
            ledger,
            earnings,
            catalog,
        }
    }

    /// The lock port as the services expect it, when strict
    pub fn agent_locks(&self) -> Option<Arc<dyn AgentLocks>> {
        self.locks.clone().map(|l| l as Arc<dyn AgentLocks>)
    }

    pub async fn add_rule(&self, rule: CommissionRule) -> CommissionRule {
        self.rules.insert_rule(&rule).await.unwrap();
        rule
    }

    /// Creates and approves one commission for the enrollment
    pub async fn approved_commission(
        &self,
        enrollment: &TestEnrollment,
        base_amount: core_kernel::Money,
    ) -> CommissionRecord {
        let record = self
            .ledger
            .create(enrollment.commission(base_amount))
            .await
            .unwrap();
        self.ledger
            .approve(record.id, IdFixtures::admin_id())
            .await
            .unwrap()
    }

    pub fn admin(&self) -> UserId {
        IdFixtures::admin_id()
    }
}

impl Default for CommissionHarness {
    fn default() -> Self {
        Self::new()
    }
}
