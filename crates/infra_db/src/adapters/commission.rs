//! PostgreSQL adapters for the commission ports
//!
//! [`PostgresRuleStore`] and [`PostgresCommissionRecordStore`] implement the
//! `RuleStore` and `CommissionRecordStore` ports over the repositories.
//! Missing rows become `PortError::NotFound` with the entity name; unique
//! violations and stale conditional updates become `PortError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AgentId, ApplicationId, CommissionRecordId, CommissionRuleId, CourseId, DomainPort,
    HealthCheckResult, HealthCheckable, PortError, UniversityId,
};
use domain_commission::{
    CommissionRecord, CommissionRecordStore, CommissionRule, CommissionStatus, RuleFilter,
    RuleStore,
};

use super::ping;
use crate::repositories::{RecordRepository, RecordRow, RuleRepository, RuleRow};

/// PostgreSQL-backed implementation of the `RuleStore` port
#[derive(Debug, Clone)]
pub struct PostgresRuleStore {
    repository: RuleRepository,
    pool: PgPool,
}

impl PostgresRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RuleRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresRuleStore {}

#[async_trait]
impl HealthCheckable for PostgresRuleStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-rule-store").await
    }
}

fn to_rules(rows: Vec<RuleRow>) -> Result<Vec<CommissionRule>, PortError> {
    rows.into_iter()
        .map(|row| CommissionRule::try_from(row).map_err(PortError::from))
        .collect()
}

#[async_trait]
impl RuleStore for PostgresRuleStore {
    #[instrument(skip_all, fields(agent_id = %agent_id, university_id = %university_id, course_id = %course_id))]
    async fn find_candidates(
        &self,
        agent_id: AgentId,
        university_id: UniversityId,
        course_id: CourseId,
    ) -> Result<Vec<CommissionRule>, PortError> {
        let rows = self
            .repository
            .find_candidates(agent_id.into(), university_id.into(), course_id.into())
            .await?;
        debug!(candidates = rows.len(), "Loaded candidate rules");
        to_rules(rows)
    }

    #[instrument(skip_all, fields(rule_id = %id))]
    async fn get_rule(&self, id: CommissionRuleId) -> Result<CommissionRule, PortError> {
        let row = self
            .repository
            .get(id.into())
            .await?
            .ok_or_else(|| PortError::not_found("CommissionRule", id))?;
        Ok(CommissionRule::try_from(row)?)
    }

    #[instrument(skip_all, fields(rule_id = %rule.id, priority = %rule.priority))]
    async fn insert_rule(&self, rule: &CommissionRule) -> Result<(), PortError> {
        self.repository.insert(rule).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(rule_id = %rule.id))]
    async fn update_rule(&self, rule: &CommissionRule) -> Result<(), PortError> {
        if !self.repository.update(rule).await? {
            return Err(PortError::not_found("CommissionRule", rule.id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_rules(&self, filter: RuleFilter) -> Result<Vec<CommissionRule>, PortError> {
        to_rules(self.repository.list(&filter).await?)
    }
}

/// PostgreSQL-backed implementation of the `CommissionRecordStore` port
#[derive(Debug, Clone)]
pub struct PostgresCommissionRecordStore {
    repository: RecordRepository,
    pool: PgPool,
}

impl PostgresCommissionRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RecordRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresCommissionRecordStore {}

#[async_trait]
impl HealthCheckable for PostgresCommissionRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-commission-record-store").await
    }
}

fn to_record(row: RecordRow) -> Result<CommissionRecord, PortError> {
    Ok(CommissionRecord::try_from(row)?)
}

#[async_trait]
impl CommissionRecordStore for PostgresCommissionRecordStore {
    #[instrument(skip_all, fields(record_id = %record.id, application_id = %record.application_id))]
    async fn insert_record(&self, record: &CommissionRecord) -> Result<(), PortError> {
        self.repository.insert(record).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(record_id = %id))]
    async fn get_record(&self, id: CommissionRecordId) -> Result<CommissionRecord, PortError> {
        let row = self
            .repository
            .get(id.into())
            .await?
            .ok_or_else(|| PortError::not_found("CommissionRecord", id))?;
        to_record(row)
    }

    #[instrument(skip_all, fields(application_id = %application_id))]
    async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<CommissionRecord>, PortError> {
        self.repository
            .find_by_application(application_id.into())
            .await?
            .map(to_record)
            .transpose()
    }

    #[instrument(skip_all, fields(agent_id = %agent_id))]
    async fn list_by_agent(
        &self,
        agent_id: AgentId,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionRecord>, PortError> {
        self.repository
            .list_by_agent(agent_id.into(), status.as_ref().map(CommissionStatus::as_str))
            .await?
            .into_iter()
            .map(to_record)
            .collect()
    }

    #[instrument(skip_all, fields(record_id = %record.id, to = %record.status))]
    async fn save_transition(
        &self,
        record: &CommissionRecord,
        expected_from: CommissionStatus,
    ) -> Result<(), PortError> {
        self.repository
            .save_transition(record, expected_from.as_str())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    PortError::not_found("CommissionRecord", record.id)
                } else {
                    e.into()
                }
            })
    }

    #[instrument(skip_all, fields(agent_id = %agent_id))]
    async fn mark_paid_for_agent(
        &self,
        agent_id: AgentId,
        paid_at: DateTime<Utc>,
    ) -> Result<u64, PortError> {
        let settled = self
            .repository
            .mark_paid_for_agent(Uuid::from(agent_id), paid_at)
            .await?;
        debug!(settled, "Settled approved commissions");
        Ok(settled)
    }
}
