//! Service wiring
//!
//! Builds the commission and payout services over either storage backend
//! and bundles them into the router state.

use std::sync::Arc;

use tracing::info;

use core_kernel::{AuditSink, HealthCheckable, TracingAuditSink};
use domain_commission::{
    AgentLocks, CommissionLedger, CommissionRecordStore, CommissionRuleResolver,
    EarningsAggregator, InMemoryCommissionRecordStore, InMemoryRuleStore, LocalAgentLocks,
    RuleCatalog, RuleStore,
};
use domain_payout::{
    InMemoryPayoutStore, LoggingNotifier, PayoutManager, PayoutNotifier, PayoutStore,
    RetryingNotifier,
};
use infra_db::{
    DatabasePool, PostgresAgentLocks, PostgresCommissionRecordStore, PostgresPayoutStore,
    PostgresRuleStore,
};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// The storage-facing ports the services are built on
pub struct Ports {
    pub rules: Arc<dyn RuleStore>,
    pub records: Arc<dyn CommissionRecordStore>,
    pub payouts: Arc<dyn PayoutStore>,
    pub locks: Option<Arc<dyn AgentLocks>>,
    pub probes: Vec<Arc<dyn HealthCheckable>>,
}

impl Ports {
    /// Process-local stores; strict mode uses in-process mutexes
    pub fn in_memory(strict: bool) -> Self {
        let rules = Arc::new(InMemoryRuleStore::new());
        let records = Arc::new(InMemoryCommissionRecordStore::new());
        let payouts = Arc::new(InMemoryPayoutStore::new());
        let locks: Option<Arc<dyn AgentLocks>> =
            strict.then(|| Arc::new(LocalAgentLocks::new()) as Arc<dyn AgentLocks>);

        Self {
            probes: vec![
                rules.clone() as Arc<dyn HealthCheckable>,
                records.clone() as Arc<dyn HealthCheckable>,
                payouts.clone() as Arc<dyn HealthCheckable>,
            ],
            rules,
            records,
            payouts,
            locks,
        }
    }

    /// PostgreSQL stores. A `lock_pool` turns on strict mode: advisory
    /// locks taken on it are shared by every instance on the database.
    pub fn postgres(pool: DatabasePool, lock_pool: Option<DatabasePool>) -> Self {
        let rules = Arc::new(PostgresRuleStore::new(pool.clone()));
        let records = Arc::new(PostgresCommissionRecordStore::new(pool.clone()));
        let payouts = Arc::new(PostgresPayoutStore::new(pool));
        let locks: Option<Arc<dyn AgentLocks>> = lock_pool
            .map(|locks| Arc::new(PostgresAgentLocks::new(locks)) as Arc<dyn AgentLocks>);

        Self {
            probes: vec![
                rules.clone() as Arc<dyn HealthCheckable>,
                records.clone() as Arc<dyn HealthCheckable>,
                payouts.clone() as Arc<dyn HealthCheckable>,
            ],
            rules,
            records,
            payouts,
            locks,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub catalog: Arc<RuleCatalog>,
    pub ledger: Arc<CommissionLedger>,
    pub earnings: Arc<EarningsAggregator>,
    pub payouts: Arc<PayoutManager>,
    pub probes: Arc<Vec<Arc<dyn HealthCheckable>>>,
}

impl AppState {
    /// Builds the services with the tracing audit sink and a retrying
    /// logging notifier
    pub fn new(config: ApiConfig, ports: Ports) -> Result<Self, ApiError> {
        let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
        let notifier: Arc<dyn PayoutNotifier> = Arc::new(RetryingNotifier::new(
            Arc::new(LoggingNotifier),
            config.retry_policy(),
        ));
        Self::with_collaborators(config, ports, audit, notifier)
    }

    pub fn with_collaborators(
        config: ApiConfig,
        ports: Ports,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn PayoutNotifier>,
    ) -> Result<Self, ApiError> {
        let currency = config
            .currency()
            .map_err(|e| ApiError::Internal(format!("invalid configured currency: {e}")))?;

        let mut ledger = CommissionLedger::new(
            ports.records,
            CommissionRuleResolver::new(ports.rules.clone()),
            audit.clone(),
            currency,
        );
        if let Some(locks) = &ports.locks {
            ledger = ledger.with_agent_locks(locks.clone());
        }
        let ledger = Arc::new(ledger);
        let earnings = Arc::new(EarningsAggregator::new(ledger.clone()));

        let mut payouts = PayoutManager::new(
            ports.payouts,
            ledger.clone(),
            earnings.clone(),
            audit.clone(),
            notifier,
        );
        if let Some(locks) = ports.locks {
            payouts = payouts.with_agent_locks(locks);
        }

        info!(
            %currency,
            consistency_mode = %config.consistency_mode,
            "Commission services ready"
        );

        Ok(Self {
            catalog: Arc::new(RuleCatalog::new(ports.rules, audit)),
            ledger,
            earnings,
            payouts: Arc::new(payouts),
            probes: Arc::new(ports.probes),
            config: Arc::new(config),
        })
    }
}
