//! Payout manager service
//!
//! Owns every mutation of [`PayoutRequest`]. The request path reads the
//! agent's approved balance from the earnings aggregator; the approval path
//! reaches back into the commission ledger to settle the agent's approved
//! commissions.
//!
//! Without agent locks the balance check and the insert are separate steps,
//! so two concurrent requests can both pass the check. With locks installed
//! (strict consistency) both sequences run under the agent's lock, and the
//! amounts of the agent's still-requested payouts are reserved against the
//! approved balance.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use core_kernel::{
    report, Actor, AgentId, AuditEntry, AuditSink, Currency, Money, PayoutId, PortError, UserId,
};
use domain_commission::{AgentLockGuard, AgentLocks, CommissionLedger, EarningsAggregator};

use crate::error::PayoutError;
use crate::notification::{PayoutNotice, PayoutNotifier};
use crate::payout::{PaymentMethod, PayoutRequest, PayoutStatus};
use crate::ports::PayoutStore;

const ENTITY: &str = "PayoutRequest";

/// Drives payout requests through their lifecycle
pub struct PayoutManager {
    payouts: Arc<dyn PayoutStore>,
    ledger: Arc<CommissionLedger>,
    earnings: Arc<EarningsAggregator>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn PayoutNotifier>,
    locks: Option<Arc<dyn AgentLocks>>,
}

impl PayoutManager {
    pub fn new(
        payouts: Arc<dyn PayoutStore>,
        ledger: Arc<CommissionLedger>,
        earnings: Arc<EarningsAggregator>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn PayoutNotifier>,
    ) -> Self {
        Self {
            payouts,
            ledger,
            earnings,
            audit,
            notifier,
            locks: None,
        }
    }

    /// Serializes request and approval per agent through `locks`
    pub fn with_agent_locks(mut self, locks: Arc<dyn AgentLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Submits a payout request on behalf of an agent.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` unless `amount` is greater than zero
    /// - `InsufficientFunds` if `amount` exceeds the approved balance
    /// - `DuplicatePayoutNumber` on a payout number collision
    #[instrument(skip_all, fields(agent_id = %agent_id, amount = %amount))]
    pub async fn request(
        &self,
        agent_id: AgentId,
        amount: Money,
        notes: Option<String>,
    ) -> Result<PayoutRequest, PayoutError> {
        let payout = PayoutRequest::new(agent_id, amount, notes)?;

        let guard = self.lock(agent_id).await?;

        let mut available = self.earnings.approved_balance(agent_id).await?;
        if guard.is_some() {
            available = available.checked_sub(&self.reserved(agent_id, amount.currency()).await?)?;
        }
        if amount.checked_sub(&available)?.is_positive() {
            info!(%available, "Payout request exceeds approved balance");
            return Err(PayoutError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        self.payouts.insert_payout(&payout).await.map_err(|e| match e {
            PortError::Conflict { .. } => {
                PayoutError::DuplicatePayoutNumber(payout.payout_number.clone())
            }
            other => other.into(),
        })?;

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::Agent(agent_id), "payout.request", ENTITY, payout.id)
                .with_new(&payout),
        )
        .await;

        info!(payout_id = %payout.id, payout_number = %payout.payout_number, "Payout requested");
        Ok(payout)
    }

    /// Approves a requested payout and settles all of the agent's approved
    /// commissions.
    ///
    /// The settlement sweeps every approved record regardless of the
    /// requested amount. If the sweep fails the payout is put back to
    /// `Requested`, so the approval can be retried. The agent is notified
    /// afterwards; a notification failure is logged and does not undo the
    /// approval.
    #[instrument(skip_all, fields(payout_id = %payout_id, processed_by = %processed_by))]
    pub async fn approve(
        &self,
        payout_id: PayoutId,
        processed_by: UserId,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
    ) -> Result<PayoutRequest, PayoutError> {
        let (mut payout, _guard) = self.load_locked(payout_id).await?;

        let requested = payout.clone();
        let before = payout.status;
        payout.approve(processed_by, payment_method, payment_reference)?;
        self.save(&payout, before).await?;

        let settled = match self.ledger.mark_paid_for_agent(payout.agent_id).await {
            Ok(settled) => settled,
            Err(e) => {
                self.revert_approval(&requested).await;
                return Err(e.into());
            }
        };
        payout.settled_commissions = settled;
        if let Err(e) = self.payouts.record_settlement(payout.id, settled).await {
            warn!(error = %e, settled, "Failed to record settlement count on payout");
        }

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(processed_by), "payout.approve", ENTITY, payout.id)
                .with_old(&before)
                .with_new(&payout),
        )
        .await;

        if let Err(e) = self.notifier.payout_approved(&PayoutNotice::from(&payout)).await {
            warn!(agent_id = %payout.agent_id, error = %e, "Payout notification failed");
        }

        info!(agent_id = %payout.agent_id, settled, "Payout approved");
        Ok(payout)
    }

    /// Rejects a requested payout; commission records are not touched
    #[instrument(skip_all, fields(payout_id = %payout_id, processed_by = %processed_by))]
    pub async fn reject(
        &self,
        payout_id: PayoutId,
        processed_by: UserId,
        notes: Option<String>,
    ) -> Result<PayoutRequest, PayoutError> {
        let mut payout = self.get(payout_id).await?;

        let before = payout.status;
        payout.reject(processed_by, notes)?;
        self.save(&payout, before).await?;

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(processed_by), "payout.reject", ENTITY, payout.id)
                .with_old(&before)
                .with_new(&payout.status),
        )
        .await;

        info!("Payout rejected");
        Ok(payout)
    }

    /// Records that the funds of an approved payout were transferred
    #[instrument(skip_all, fields(payout_id = %payout_id, processed_by = %processed_by))]
    pub async fn mark_paid(
        &self,
        payout_id: PayoutId,
        processed_by: UserId,
        payment_reference: Option<String>,
    ) -> Result<PayoutRequest, PayoutError> {
        let mut payout = self.get(payout_id).await?;

        let before = payout.status;
        payout.mark_paid(processed_by, payment_reference)?;
        self.save(&payout, before).await?;

        report(
            self.audit.as_ref(),
            AuditEntry::new(Actor::User(processed_by), "payout.mark_paid", ENTITY, payout.id)
                .with_old(&before)
                .with_new(&payout.status),
        )
        .await;

        info!("Payout marked paid");
        Ok(payout)
    }

    pub async fn get(&self, payout_id: PayoutId) -> Result<PayoutRequest, PayoutError> {
        self.payouts.get_payout(payout_id).await.map_err(|e| match e {
            PortError::NotFound { .. } => PayoutError::NotFound(payout_id.to_string()),
            other => other.into(),
        })
    }

    pub async fn list_by_agent(&self, agent_id: AgentId) -> Result<Vec<PayoutRequest>, PayoutError> {
        Ok(self.payouts.list_by_agent(agent_id).await?)
    }

    /// Sum of the agent's payouts still awaiting a decision
    async fn reserved(&self, agent_id: AgentId, currency: Currency) -> Result<Money, PayoutError> {
        let mut reserved = Money::zero(currency);
        for payout in self.payouts.list_by_agent(agent_id).await? {
            if payout.status == PayoutStatus::Requested {
                reserved = reserved.checked_add(&payout.amount)?;
            }
        }
        Ok(reserved)
    }

    /// Restores a payout whose approval could not settle its commissions
    async fn revert_approval(&self, requested: &PayoutRequest) {
        match self.payouts.save_transition(requested, PayoutStatus::Approved).await {
            Ok(()) => warn!(payout_id = %requested.id, "Settlement failed, payout returned to requested"),
            Err(e) => error!(
                payout_id = %requested.id,
                error = %e,
                "Settlement failed and the payout could not be returned to requested"
            ),
        }
    }

    async fn lock(&self, agent_id: AgentId) -> Result<Option<AgentLockGuard>, PayoutError> {
        match &self.locks {
            Some(locks) => Ok(Some(locks.lock(agent_id).await?)),
            None => Ok(None),
        }
    }

    /// Loads a payout and, in strict mode, locks its agent and re-reads it
    async fn load_locked(
        &self,
        payout_id: PayoutId,
    ) -> Result<(PayoutRequest, Option<AgentLockGuard>), PayoutError> {
        let payout = self.get(payout_id).await?;
        match self.lock(payout.agent_id).await? {
            Some(guard) => Ok((self.get(payout_id).await?, Some(guard))),
            None => Ok((payout, None)),
        }
    }

    async fn save(&self, payout: &PayoutRequest, expected_from: PayoutStatus) -> Result<(), PayoutError> {
        self.payouts
            .save_transition(payout, expected_from)
            .await
            .map_err(|e| match e {
                PortError::Conflict { .. } => PayoutError::invalid_transition(
                    format!("{} (changed concurrently)", expected_from),
                    payout.status,
                ),
                other => other.into(),
            })
    }
}
