//! In-memory adapters
//!
//! Used by the `memory` storage backend of the API and by the test suites.
//! Each store keeps its state behind a `tokio::sync::RwLock`; conditional
//! writes (`save_transition`, `mark_paid_for_agent`) run under the write lock
//! so they are atomic with respect to each other.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use core_kernel::{
    AgentId, ApplicationId, CommissionRecordId, CommissionRuleId, CourseId, DomainPort,
    HealthCheckResult, HealthCheckable, PortError, UniversityId,
};

use crate::ports::{
    AgentLockGuard, AgentLocks, CommissionRecordStore, RuleFilter, RuleStore,
};
use crate::record::{CommissionRecord, CommissionStatus};
use crate::rule::CommissionRule;

/// Rule store backed by a hash map
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<CommissionRuleId, CommissionRule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store
    pub async fn with_rules(rules: Vec<CommissionRule>) -> Self {
        let store = Self::new();
        {
            let mut map = store.rules.write().await;
            for rule in rules {
                map.insert(rule.id, rule);
            }
        }
        store
    }
}

impl DomainPort for InMemoryRuleStore {}

#[async_trait]
impl HealthCheckable for InMemoryRuleStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-rule-store")
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn find_candidates(
        &self,
        agent_id: AgentId,
        university_id: UniversityId,
        course_id: CourseId,
    ) -> Result<Vec<CommissionRule>, PortError> {
        let rules = self.rules.read().await;
        Ok(rules
            .values()
            .filter(|r| r.active)
            .filter(|r| r.agent_id.map_or(true, |a| a == agent_id))
            .filter(|r| {
                r.course_id == Some(course_id)
                    || (r.course_id.is_none() && r.university_id == Some(university_id))
            })
            .cloned()
            .collect())
    }

    async fn get_rule(&self, id: CommissionRuleId) -> Result<CommissionRule, PortError> {
        self.rules
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("CommissionRule", id))
    }

    async fn insert_rule(&self, rule: &CommissionRule) -> Result<(), PortError> {
        let mut rules = self.rules.write().await;
        if rules.contains_key(&rule.id) {
            return Err(PortError::conflict(format!("rule {} already exists", rule.id)));
        }
        rules.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn update_rule(&self, rule: &CommissionRule) -> Result<(), PortError> {
        let mut rules = self.rules.write().await;
        let stored = rules
            .get_mut(&rule.id)
            .ok_or_else(|| PortError::not_found("CommissionRule", rule.id))?;
        *stored = rule.clone();
        Ok(())
    }

    async fn list_rules(&self, filter: RuleFilter) -> Result<Vec<CommissionRule>, PortError> {
        let rules = self.rules.read().await;
        let mut matched: Vec<_> = rules.values().filter(|r| filter.accepts(r)).cloned().collect();
        matched.sort_by_key(|r| (r.created_at, r.id));
        Ok(matched)
    }
}

#[derive(Debug, Default)]
struct RecordTables {
    records: HashMap<CommissionRecordId, CommissionRecord>,
    by_application: HashMap<ApplicationId, CommissionRecordId>,
}

/// Commission record store backed by hash maps
#[derive(Debug, Default)]
pub struct InMemoryCommissionRecordStore {
    tables: RwLock<RecordTables>,
}

impl InMemoryCommissionRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl DomainPort for InMemoryCommissionRecordStore {}

#[async_trait]
impl HealthCheckable for InMemoryCommissionRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-commission-record-store")
    }
}

#[async_trait]
impl CommissionRecordStore for InMemoryCommissionRecordStore {
    async fn insert_record(&self, record: &CommissionRecord) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        if tables.by_application.contains_key(&record.application_id) {
            return Err(PortError::conflict(format!(
                "commission already recorded for application {}",
                record.application_id
            )));
        }
        tables.by_application.insert(record.application_id, record.id);
        tables.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_record(&self, id: CommissionRecordId) -> Result<CommissionRecord, PortError> {
        self.tables
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("CommissionRecord", id))
    }

    async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<CommissionRecord>, PortError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_application
            .get(&application_id)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn list_by_agent(
        &self,
        agent_id: AgentId,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionRecord>, PortError> {
        let tables = self.tables.read().await;
        let mut records: Vec<_> = tables
            .records
            .values()
            .filter(|r| r.agent_id == agent_id)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.created_at, r.id));
        Ok(records)
    }

    async fn save_transition(
        &self,
        record: &CommissionRecord,
        expected_from: CommissionStatus,
    ) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .records
            .get_mut(&record.id)
            .ok_or_else(|| PortError::not_found("CommissionRecord", record.id))?;

        if stored.status != expected_from {
            return Err(PortError::conflict(format!(
                "record {} is {}, expected {}",
                record.id, stored.status, expected_from
            )));
        }
        *stored = record.clone();
        Ok(())
    }

    async fn mark_paid_for_agent(
        &self,
        agent_id: AgentId,
        paid_at: DateTime<Utc>,
    ) -> Result<u64, PortError> {
        let mut tables = self.tables.write().await;
        let mut settled = 0;
        for record in tables
            .records
            .values_mut()
            .filter(|r| r.agent_id == agent_id && r.status == CommissionStatus::Approved)
        {
            record
                .settle(paid_at)
                .map_err(|e| PortError::internal(e.to_string()))?;
            settled += 1;
        }
        Ok(settled)
    }
}

/// In-process per-agent locks for single-instance deployments.
///
/// Only agents with a holder or a waiter keep a slot; idle slots are
/// dropped the next time any lock is taken.
#[derive(Debug, Default)]
pub struct LocalAgentLocks {
    locks: Mutex<HashMap<AgentId, Arc<Mutex<()>>>>,
}

impl LocalAgentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agents currently holding or waiting for a slot
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

impl DomainPort for LocalAgentLocks {}

#[async_trait]
impl AgentLocks for LocalAgentLocks {
    async fn lock(&self, agent_id: AgentId) -> Result<AgentLockGuard, PortError> {
        let slot = {
            let mut locks = self.locks.lock().await;
            // the map's own reference is the only one left on an idle slot
            locks.retain(|id, slot| *id == agent_id || Arc::strong_count(slot) > 1);
            Arc::clone(locks.entry(agent_id).or_default())
        };
        let guard = slot.lock_owned().await;
        Ok(AgentLockGuard::new(agent_id, guard))
    }
}
