//! Administrative management of commission rules

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use core_kernel::{report, Actor, AuditEntry, AuditSink, CommissionRuleId, PortError, UserId};

use crate::error::CommissionError;
use crate::ports::{RuleFilter, RuleStore};
use crate::rule::{CommissionRule, RuleKind, RuleScope};

const ENTITY: &str = "CommissionRule";

/// Input for [`RuleCatalog::create`]
#[derive(Debug, Clone)]
pub struct NewRule {
    pub scope: RuleScope,
    pub kind: RuleKind,
    pub value: Decimal,
    pub description: Option<String>,
}

/// Creates, edits and (de)activates rules on behalf of administrators.
///
/// Rules are never deleted; deactivation removes them from resolution.
pub struct RuleCatalog {
    rules: Arc<dyn RuleStore>,
    audit: Arc<dyn AuditSink>,
}

impl RuleCatalog {
    pub fn new(rules: Arc<dyn RuleStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { rules, audit }
    }

    #[instrument(skip_all, fields(created_by = %created_by))]
    pub async fn create(
        &self,
        input: NewRule,
        created_by: UserId,
    ) -> Result<CommissionRule, CommissionError> {
        let mut rule = CommissionRule::new(input.scope, input.kind, input.value)?;
        rule.description = input.description;

        self.rules.insert_rule(&rule).await?;

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(created_by), "rule.create", ENTITY, rule.id).with_new(&rule),
        )
        .await;

        info!(rule_id = %rule.id, priority = rule.priority.priority(), "Commission rule created");
        Ok(rule)
    }

    /// Changes pricing; records already created keep their snapshot
    #[instrument(skip_all, fields(rule_id = %rule_id))]
    pub async fn update_pricing(
        &self,
        rule_id: CommissionRuleId,
        kind: RuleKind,
        value: Decimal,
        updated_by: UserId,
    ) -> Result<CommissionRule, CommissionError> {
        let mut rule = self.get(rule_id).await?;
        let before = rule.clone();

        rule.reprice(kind, value)?;
        self.rules.update_rule(&rule).await.map_err(|e| not_found(e, rule_id))?;

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(updated_by), "rule.update_pricing", ENTITY, rule.id)
                .with_old(&before)
                .with_new(&rule),
        )
        .await;

        Ok(rule)
    }

    pub async fn deactivate(
        &self,
        rule_id: CommissionRuleId,
        updated_by: UserId,
    ) -> Result<CommissionRule, CommissionError> {
        self.set_active(rule_id, false, updated_by).await
    }

    pub async fn activate(
        &self,
        rule_id: CommissionRuleId,
        updated_by: UserId,
    ) -> Result<CommissionRule, CommissionError> {
        self.set_active(rule_id, true, updated_by).await
    }

    pub async fn get(&self, rule_id: CommissionRuleId) -> Result<CommissionRule, CommissionError> {
        self.rules
            .get_rule(rule_id)
            .await
            .map_err(|e| not_found(e, rule_id))
    }

    pub async fn list(&self, filter: RuleFilter) -> Result<Vec<CommissionRule>, CommissionError> {
        Ok(self.rules.list_rules(filter).await?)
    }

    async fn set_active(
        &self,
        rule_id: CommissionRuleId,
        active: bool,
        updated_by: UserId,
    ) -> Result<CommissionRule, CommissionError> {
        let mut rule = self.get(rule_id).await?;
        if rule.active == active {
            return Ok(rule);
        }

        if active {
            rule.activate();
        } else {
            rule.deactivate();
        }
        self.rules.update_rule(&rule).await.map_err(|e| not_found(e, rule_id))?;

        let action = if active { "rule.activate" } else { "rule.deactivate" };
        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(updated_by), action, ENTITY, rule.id)
                .with_old(&!active)
                .with_new(&active),
        )
        .await;

        info!(rule_id = %rule.id, active, "Commission rule activity changed");
        Ok(rule)
    }
}

fn not_found(error: PortError, rule_id: CommissionRuleId) -> CommissionError {
    match error {
        PortError::NotFound { .. } => CommissionError::RuleNotFound(rule_id.to_string()),
        other => other.into(),
    }
}
