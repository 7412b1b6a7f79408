//! Audit collaborator port
//!
//! Every state-changing operation in the commission and payout domains is
//! reported as an [`AuditEntry`]. Persistence of the audit trail lives outside
//! this workspace; domain services only see the [`AuditSink`] port.
//!
//! Reporting is fire-and-forget: [`report`] swallows sink failures after
//! logging them, so an unavailable audit store never fails the primary
//! operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::identifiers::{AgentId, AuditEventId, UserId};
use crate::ports::PortError;

/// Who performed an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// A back-office user (administrator)
    User(UserId),
    /// A recruitment agent acting on their own account
    Agent(AgentId),
    /// The system itself (workflow callbacks, settlement sweeps)
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(id) => write!(f, "{}", id),
            Actor::Agent(id) => write!(f, "{}", id),
            Actor::System => write!(f, "system"),
        }
    }
}

/// A single audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEventId,
    pub actor: Actor,
    /// Verb describing the change, e.g. `commission.approve`
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry without before/after values
    pub fn new(
        actor: Actor,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl fmt::Display,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            actor,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
            old_value: None,
            new_value: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attaches the value before the change
    pub fn with_old<T: Serialize>(mut self, value: &T) -> Self {
        self.old_value = serde_json::to_value(value).ok();
        self
    }

    /// Attaches the value after the change
    pub fn with_new<T: Serialize>(mut self, value: &T) -> Self {
        self.new_value = serde_json::to_value(value).ok();
        self
    }
}

/// Outbound port to the audit trail
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record(&self, entry: AuditEntry) -> Result<(), PortError>;
}

/// Reports an entry, logging and discarding any sink failure
pub async fn report(sink: &dyn AuditSink, entry: AuditEntry) {
    let action = entry.action.clone();
    let entity_id = entry.entity_id.clone();
    if let Err(e) = sink.record(entry).await {
        warn!(%action, %entity_id, error = %e, "Audit sink rejected entry");
    }
}

/// Audit sink that emits each entry as a structured tracing event
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), PortError> {
        info!(
            target: "audit",
            audit_id = %entry.id,
            actor = %entry.actor,
            action = %entry.action,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            old_value = ?entry.old_value,
            new_value = ?entry.new_value,
            "Audit event"
        );
        Ok(())
    }
}

/// Audit sink that keeps entries in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded entries, oldest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Returns the recorded actions in order
    pub async fn actions(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), PortError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
