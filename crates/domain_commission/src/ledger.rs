//! Commission ledger service
//!
//! Owns every mutation of [`CommissionRecord`]. Records are created once per
//! application and only ever move forward through their lifecycle.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use core_kernel::{
    report, Actor, AgentId, ApplicationId, AuditEntry, AuditSink, CommissionRecordId, CourseId,
    Currency, Money, PortError, UniversityId, UserId,
};

use crate::error::CommissionError;
use crate::ports::{AgentLocks, CommissionRecordStore};
use crate::record::{CommissionRecord, CommissionStatus};
use crate::resolver::{CommissionRuleResolver, EnrollmentContext};

const ENTITY: &str = "CommissionRecord";

/// Input for [`CommissionLedger::create`]
#[derive(Debug, Clone, Copy)]
pub struct NewCommission {
    pub application_id: ApplicationId,
    pub agent_id: AgentId,
    pub course_id: CourseId,
    pub university_id: UniversityId,
    pub base_amount: Money,
}

impl NewCommission {
    fn context(&self) -> EnrollmentContext {
        EnrollmentContext {
            agent_id: self.agent_id,
            course_id: self.course_id,
            university_id: self.university_id,
            base_amount: self.base_amount,
        }
    }
}

/// Creates, approves and settles commission records
pub struct CommissionLedger {
    records: Arc<dyn CommissionRecordStore>,
    resolver: CommissionRuleResolver,
    audit: Arc<dyn AuditSink>,
    currency: Currency,
    locks: Option<Arc<dyn AgentLocks>>,
}

impl CommissionLedger {
    /// `currency` is the operating currency; every record is booked in it
    pub fn new(
        records: Arc<dyn CommissionRecordStore>,
        resolver: CommissionRuleResolver,
        audit: Arc<dyn AuditSink>,
        currency: Currency,
    ) -> Self {
        Self {
            records,
            resolver,
            audit,
            currency,
            locks: None,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Serializes `approve` per agent through `locks` (strict consistency)
    pub fn with_agent_locks(mut self, locks: Arc<dyn AgentLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Prices and records the commission for an application.
    ///
    /// # Errors
    ///
    /// - `DuplicateRecord` if the application already has a record
    /// - `InvalidAmount` if the base amount is negative, is not in the
    ///   operating currency, or is finer than the currency's minor unit
    #[instrument(skip_all, fields(application_id = %input.application_id, agent_id = %input.agent_id))]
    pub async fn create(&self, input: NewCommission) -> Result<CommissionRecord, CommissionError> {
        if input.base_amount.is_negative() {
            return Err(CommissionError::InvalidAmount(format!(
                "base amount must not be negative, got {}",
                input.base_amount
            )));
        }
        if input.base_amount.currency() != self.currency {
            return Err(CommissionError::InvalidAmount(format!(
                "base amount must be in {}, got {}",
                self.currency,
                input.base_amount.currency()
            )));
        }
        if !input.base_amount.fits_minor_units() {
            return Err(CommissionError::InvalidAmount(format!(
                "base amount {} has more decimal places than {} allows",
                input.base_amount.amount(),
                self.currency
            )));
        }

        if self
            .records
            .find_by_application(input.application_id)
            .await?
            .is_some()
        {
            return Err(duplicate(input.application_id));
        }

        let ctx = input.context();
        let resolution = self.resolver.resolve(&ctx).await?;
        if !resolution.is_matched() {
            warn!("No commission rule configured, recording zero commission");
        }

        let record = CommissionRecord::pending(input.application_id, &ctx, resolution);
        self.records
            .insert_record(&record)
            .await
            .map_err(|e| match e {
                PortError::Conflict { .. } => duplicate(input.application_id),
                other => other.into(),
            })?;

        info!(record_id = %record.id, amount = %record.amount, "Commission recorded");
        Ok(record)
    }

    /// Approves a pending record.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if the record does not exist
    /// - `InvalidTransition` unless the record is pending
    #[instrument(skip_all, fields(record_id = %record_id, approved_by = %approved_by))]
    pub async fn approve(
        &self,
        record_id: CommissionRecordId,
        approved_by: UserId,
    ) -> Result<CommissionRecord, CommissionError> {
        let mut record = self.get(record_id).await?;

        let _guard = match &self.locks {
            Some(locks) => {
                let guard = locks.lock(record.agent_id).await?;
                // re-read under the lock
                record = self.get(record_id).await?;
                Some(guard)
            }
            None => None,
        };

        let before = record.status;
        record.approve(approved_by)?;
        self.records
            .save_transition(&record, before)
            .await
            .map_err(|e| match e {
                PortError::Conflict { .. } => CommissionError::invalid_transition(
                    format!("{} (changed concurrently)", before),
                    CommissionStatus::Approved,
                ),
                other => other.into(),
            })?;

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(approved_by), "commission.approve", ENTITY, record.id)
                .with_old(&before)
                .with_new(&record.status),
        )
        .await;

        info!(agent_id = %record.agent_id, "Commission approved");
        Ok(record)
    }

    pub async fn get(&self, record_id: CommissionRecordId) -> Result<CommissionRecord, CommissionError> {
        self.records.get_record(record_id).await.map_err(|e| match e {
            PortError::NotFound { .. } => CommissionError::RecordNotFound(record_id.to_string()),
            other => other.into(),
        })
    }

    pub async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<CommissionRecord>, CommissionError> {
        Ok(self.records.find_by_application(application_id).await?)
    }

    pub async fn list_by_agent(
        &self,
        agent_id: AgentId,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionRecord>, CommissionError> {
        Ok(self.records.list_by_agent(agent_id, status).await?)
    }

    /// Settles every approved record of the agent.
    ///
    /// Idempotent: once nothing is approved, a repeat call settles zero
    /// records. Never takes the agent lock; callers in strict mode already
    /// hold it.
    #[instrument(skip_all, fields(agent_id = %agent_id))]
    pub async fn mark_paid_for_agent(&self, agent_id: AgentId) -> Result<u64, CommissionError> {
        let settled = self.records.mark_paid_for_agent(agent_id, Utc::now()).await?;

        if settled > 0 {
            report(
                self.audit.as_ref(),
                AuditEntry::new(Actor::System, "commission.settle", ENTITY, agent_id)
                    .with_new(&serde_json::json!({ "settled": settled, "status": CommissionStatus::Paid })),
            )
            .await;
        }

        info!(settled, "Approved commissions settled");
        Ok(settled)
    }
}

fn duplicate(application_id: ApplicationId) -> CommissionError {
    CommissionError::DuplicateRecord {
        application_id: application_id.to_string(),
    }
}
