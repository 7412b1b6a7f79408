//! Commission Domain Ports
//!
//! Outbound port traits for the commission domain. Services receive these as
//! `Arc<dyn ...>` so storage can be swapped between PostgreSQL (`infra_db`)
//! and the in-memory adapters in [`crate::memory`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_commission::{CommissionRuleResolver, InMemoryRuleStore};
//! use std::sync::Arc;
//!
//! let rules: Arc<dyn RuleStore> = Arc::new(InMemoryRuleStore::new());
//! let resolver = CommissionRuleResolver::new(rules);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    AgentId, ApplicationId, CommissionRecordId, CommissionRuleId, CourseId, DomainPort,
    HealthCheckable, PortError, UniversityId,
};

use crate::error::CommissionError;
use crate::record::{CommissionRecord, CommissionStatus};
use crate::rule::{CommissionRule, RuleTier};

/// Query parameters for listing rules
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub agent_id: Option<AgentId>,
    pub university_id: Option<UniversityId>,
    pub course_id: Option<CourseId>,
    pub priority: Option<RuleTier>,
    pub active: Option<bool>,
}

impl RuleFilter {
    pub fn active_only() -> Self {
        Self {
            active: Some(true),
            ..Default::default()
        }
    }

    pub fn for_agent(agent_id: AgentId) -> Self {
        Self {
            agent_id: Some(agent_id),
            ..Default::default()
        }
    }

    /// Returns true if `rule` passes every set criterion
    pub fn accepts(&self, rule: &CommissionRule) -> bool {
        self.agent_id.map_or(true, |a| rule.agent_id == Some(a))
            && self.university_id.map_or(true, |u| rule.university_id == Some(u))
            && self.course_id.map_or(true, |c| rule.course_id == Some(c))
            && self.priority.map_or(true, |p| rule.priority == p)
            && self.active.map_or(true, |a| rule.active == a)
    }
}

/// Storage for commission rule definitions
#[async_trait]
pub trait RuleStore: DomainPort + HealthCheckable {
    /// Returns the active rules that could match the enrollment at any tier.
    ///
    /// Ordering is unspecified; the resolver applies precedence. An empty
    /// vector is returned when nothing matches.
    async fn find_candidates(
        &self,
        agent_id: AgentId,
        university_id: UniversityId,
        course_id: CourseId,
    ) -> Result<Vec<CommissionRule>, PortError>;

    /// Retrieves a rule by ID, `PortError::NotFound` on miss
    async fn get_rule(&self, id: CommissionRuleId) -> Result<CommissionRule, PortError>;

    async fn insert_rule(&self, rule: &CommissionRule) -> Result<(), PortError>;

    /// Overwrites a stored rule, `PortError::NotFound` if it does not exist
    async fn update_rule(&self, rule: &CommissionRule) -> Result<(), PortError>;

    /// Lists rules matching `filter`, oldest first
    async fn list_rules(&self, filter: RuleFilter) -> Result<Vec<CommissionRule>, PortError>;
}

/// Storage for commission records
#[async_trait]
pub trait CommissionRecordStore: DomainPort + HealthCheckable {
    /// Inserts a new record.
    ///
    /// Returns `PortError::Conflict` if the application already has a record.
    async fn insert_record(&self, record: &CommissionRecord) -> Result<(), PortError>;

    async fn get_record(&self, id: CommissionRecordId) -> Result<CommissionRecord, PortError>;

    async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<CommissionRecord>, PortError>;

    /// Lists an agent's records, oldest first, optionally filtered by status
    async fn list_by_agent(
        &self,
        agent_id: AgentId,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionRecord>, PortError>;

    /// Persists a status change.
    ///
    /// The write only applies if the stored status still equals
    /// `expected_from`; otherwise `PortError::Conflict` is returned and nothing
    /// is written.
    async fn save_transition(
        &self,
        record: &CommissionRecord,
        expected_from: CommissionStatus,
    ) -> Result<(), PortError>;

    /// Moves every approved record of the agent to paid in one step.
    ///
    /// Returns the number of records settled. Pending records are untouched.
    async fn mark_paid_for_agent(
        &self,
        agent_id: AgentId,
        paid_at: DateTime<Utc>,
    ) -> Result<u64, PortError>;
}

/// Held per-agent lock; released when dropped
pub struct AgentLockGuard {
    agent_id: AgentId,
    _inner: Box<dyn Any + Send>,
}

impl AgentLockGuard {
    /// Wraps an adapter-specific guard value
    pub fn new(agent_id: AgentId, inner: impl Any + Send) -> Self {
        Self {
            agent_id,
            _inner: Box::new(inner),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }
}

impl fmt::Debug for AgentLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentLockGuard")
            .field("agent_id", &self.agent_id)
            .finish()
    }
}

/// Per-agent mutual exclusion used by strict consistency mode
#[async_trait]
pub trait AgentLocks: DomainPort {
    /// Waits for and acquires the agent's lock
    async fn lock(&self, agent_id: AgentId) -> Result<AgentLockGuard, PortError>;
}

/// How balance-sensitive sequences are guarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// Check-then-act sequences run unguarded
    #[default]
    Relaxed,
    /// Per-agent sequences are serialized through `AgentLocks`
    Strict,
}

impl ConsistencyMode {
    pub fn is_strict(&self) -> bool {
        matches!(self, ConsistencyMode::Strict)
    }
}

impl fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyMode::Relaxed => f.write_str("relaxed"),
            ConsistencyMode::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for ConsistencyMode {
    type Err = CommissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relaxed" => Ok(ConsistencyMode::Relaxed),
            "strict" => Ok(ConsistencyMode::Strict),
            other => Err(CommissionError::Validation(format!(
                "unknown consistency mode '{}'",
                other
            ))),
        }
    }
}
