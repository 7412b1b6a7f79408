//! In-memory payout store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{AgentId, DomainPort, HealthCheckResult, HealthCheckable, PayoutId, PortError};

use crate::payout::{PayoutRequest, PayoutStatus};
use crate::ports::PayoutStore;

#[derive(Debug, Default)]
pub struct InMemoryPayoutStore {
    payouts: RwLock<HashMap<PayoutId, PayoutRequest>>,
}

impl InMemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payouts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl DomainPort for InMemoryPayoutStore {}

#[async_trait]
impl HealthCheckable for InMemoryPayoutStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-payout-store")
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<(), PortError> {
        let mut payouts = self.payouts.write().await;
        if payouts
            .values()
            .any(|p| p.payout_number == payout.payout_number)
        {
            return Err(PortError::conflict(format!(
                "payout number {} already exists",
                payout.payout_number
            )));
        }
        payouts.insert(payout.id, payout.clone());
        Ok(())
    }

    async fn get_payout(&self, id: PayoutId) -> Result<PayoutRequest, PortError> {
        self.payouts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("PayoutRequest", id))
    }

    async fn save_transition(
        &self,
        payout: &PayoutRequest,
        expected_from: PayoutStatus,
    ) -> Result<(), PortError> {
        let mut payouts = self.payouts.write().await;
        let stored = payouts
            .get_mut(&payout.id)
            .ok_or_else(|| PortError::not_found("PayoutRequest", payout.id))?;
        if stored.status != expected_from {
            return Err(PortError::conflict(format!(
                "payout {} is {}, expected {}",
                payout.id, stored.status, expected_from
            )));
        }
        *stored = payout.clone();
        Ok(())
    }

    async fn record_settlement(&self, id: PayoutId, settled: u64) -> Result<(), PortError> {
        let mut payouts = self.payouts.write().await;
        let stored = payouts
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("PayoutRequest", id))?;
        stored.settled_commissions = settled;
        Ok(())
    }

    async fn list_by_agent(&self, agent_id: AgentId) -> Result<Vec<PayoutRequest>, PortError> {
        let payouts = self.payouts.read().await;
        let mut list: Vec<_> = payouts
            .values()
            .filter(|p| p.agent_id == agent_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }
}
