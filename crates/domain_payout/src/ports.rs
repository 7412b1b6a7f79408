//! Payout Domain Ports

use async_trait::async_trait;

use core_kernel::{AgentId, DomainPort, HealthCheckable, PayoutId, PortError};

use crate::payout::{PayoutRequest, PayoutStatus};

/// Storage for payout requests
#[async_trait]
pub trait PayoutStore: DomainPort + HealthCheckable {
    /// Inserts a new payout.
    ///
    /// Returns `PortError::Conflict` if the payout number is already taken.
    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<(), PortError>;

    async fn get_payout(&self, id: PayoutId) -> Result<PayoutRequest, PortError>;

    /// Persists a status change, applied only while the stored status still
    /// equals `expected_from` (`PortError::Conflict` otherwise)
    async fn save_transition(
        &self,
        payout: &PayoutRequest,
        expected_from: PayoutStatus,
    ) -> Result<(), PortError>;

    /// Stores how many commission records an approval settled
    async fn record_settlement(&self, id: PayoutId, settled: u64) -> Result<(), PortError>;

    /// Lists an agent's payouts, newest first
    async fn list_by_agent(&self, agent_id: AgentId) -> Result<Vec<PayoutRequest>, PortError>;
}
