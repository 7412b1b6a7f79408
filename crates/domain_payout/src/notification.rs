//! Notification collaborator port
//!
//! The manager tells the agent when a payout is approved. Delivery (email or
//! otherwise) lives outside this workspace; [`LoggingNotifier`] stands in for
//! it, and [`RetryingNotifier`] wraps any notifier with background retries so
//! a slow or failing delivery never holds up the approval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{AgentId, DomainPort, Money, PayoutId, PortError};

use crate::payout::{PaymentMethod, PayoutRequest};

/// What the agent is told about an approved payout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutNotice {
    pub payout_id: PayoutId,
    pub payout_number: String,
    pub agent_id: AgentId,
    pub amount: Money,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
}

impl From<&PayoutRequest> for PayoutNotice {
    fn from(payout: &PayoutRequest) -> Self {
        Self {
            payout_id: payout.id,
            payout_number: payout.payout_number.clone(),
            agent_id: payout.agent_id,
            amount: payout.amount,
            payment_method: payout.payment_method,
            payment_reference: payout.payment_reference.clone(),
        }
    }
}

/// Outbound port to the notification collaborator
#[async_trait]
pub trait PayoutNotifier: DomainPort {
    async fn payout_approved(&self, notice: &PayoutNotice) -> Result<(), PortError>;
}

/// Notifier that only logs
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

impl DomainPort for LoggingNotifier {}

#[async_trait]
impl PayoutNotifier for LoggingNotifier {
    async fn payout_approved(&self, notice: &PayoutNotice) -> Result<(), PortError> {
        info!(
            target: "notification",
            agent_id = %notice.agent_id,
            payout_number = %notice.payout_number,
            amount = %notice.amount,
            "Payout approved notification"
        );
        Ok(())
    }
}

/// Retry schedule for notification delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Decorator that delivers on a spawned task with exponential backoff.
///
/// `payout_approved` returns as soon as the task is spawned. Final failure is
/// logged and dropped.
pub struct RetryingNotifier {
    inner: Arc<dyn PayoutNotifier>,
    policy: RetryPolicy,
}

impl RetryingNotifier {
    pub fn new(inner: Arc<dyn PayoutNotifier>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Runs the full attempt/retry sequence, returning the last error if every
    /// attempt failed
    pub async fn deliver(
        inner: &dyn PayoutNotifier,
        policy: RetryPolicy,
        notice: &PayoutNotice,
    ) -> Result<(), PortError> {
        let mut attempt = 0;
        loop {
            match inner.payout_approved(notice).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < policy.max_retries => {
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    warn!(
                        payout_id = %notice.payout_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Payout notification failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl DomainPort for RetryingNotifier {}

#[async_trait]
impl PayoutNotifier for RetryingNotifier {
    async fn payout_approved(&self, notice: &PayoutNotice) -> Result<(), PortError> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy;
        let notice = notice.clone();

        tokio::spawn(async move {
            if let Err(e) = RetryingNotifier::deliver(inner.as_ref(), policy, &notice).await {
                warn!(
                    payout_id = %notice.payout_id,
                    agent_id = %notice.agent_id,
                    error = %e,
                    "Payout notification abandoned after retries"
                );
            }
        });

        Ok(())
    }
}
