//! PostgreSQL adapter for the payout port

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};

use core_kernel::{AgentId, DomainPort, HealthCheckResult, HealthCheckable, PayoutId, PortError};
use domain_payout::{PayoutRequest, PayoutStatus, PayoutStore};

use super::ping;
use crate::repositories::PayoutRepository;

/// PostgreSQL-backed implementation of the `PayoutStore` port
#[derive(Debug, Clone)]
pub struct PostgresPayoutStore {
    repository: PayoutRepository,
    pool: PgPool,
}

impl PostgresPayoutStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PayoutRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresPayoutStore {}

#[async_trait]
impl HealthCheckable for PostgresPayoutStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-payout-store").await
    }
}

#[async_trait]
impl PayoutStore for PostgresPayoutStore {
    #[instrument(skip_all, fields(payout_id = %payout.id, payout_number = %payout.payout_number))]
    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<(), PortError> {
        self.repository.insert(payout).await.map_err(|e| {
            if e.is_constraint_violation() {
                warn!(error = %e, "Payout insert rejected by constraint");
            }
            e.into()
        })
    }

    #[instrument(skip_all, fields(payout_id = %id))]
    async fn get_payout(&self, id: PayoutId) -> Result<PayoutRequest, PortError> {
        let row = self
            .repository
            .get(id.into())
            .await?
            .ok_or_else(|| PortError::not_found("PayoutRequest", id))?;
        Ok(PayoutRequest::try_from(row)?)
    }

    #[instrument(skip_all, fields(payout_id = %payout.id, to = %payout.status))]
    async fn save_transition(
        &self,
        payout: &PayoutRequest,
        expected_from: PayoutStatus,
    ) -> Result<(), PortError> {
        self.repository
            .save_transition(payout, expected_from.as_str())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    PortError::not_found("PayoutRequest", payout.id)
                } else {
                    e.into()
                }
            })
    }

    #[instrument(skip_all, fields(payout_id = %id))]
    async fn record_settlement(&self, id: PayoutId, settled: u64) -> Result<(), PortError> {
        if !self.repository.record_settlement(id.into(), settled).await? {
            return Err(PortError::not_found("PayoutRequest", id));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(agent_id = %agent_id))]
    async fn list_by_agent(&self, agent_id: AgentId) -> Result<Vec<PayoutRequest>, PortError> {
        self.repository
            .list_by_agent(agent_id.into())
            .await?
            .into_iter()
            .map(|row| PayoutRequest::try_from(row).map_err(PortError::from))
            .collect()
    }
}
