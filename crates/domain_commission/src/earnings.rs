//! Agent earnings aggregation
//!
//! Sums are recomputed from the ledger on every call. Nothing is cached, so a
//! summary always reflects the records as they are stored right now.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{AgentId, Currency, Money};

use crate::error::CommissionError;
use crate::ledger::CommissionLedger;
use crate::record::{CommissionRecord, CommissionStatus};

/// Per-status commission totals for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    pub agent_id: AgentId,
    pub currency: Currency,
    pub total: Money,
    pub pending: Money,
    pub approved: Money,
    pub paid: Money,
    pub record_count: usize,
}

impl EarningsSummary {
    /// Folds records into per-status buckets.
    ///
    /// `total` is derived from the three buckets, so
    /// `total == pending + approved + paid` holds by construction.
    pub fn from_records<'a, I>(
        agent_id: AgentId,
        currency: Currency,
        records: I,
    ) -> Result<Self, CommissionError>
    where
        I: IntoIterator<Item = &'a CommissionRecord>,
    {
        let mut pending = Money::zero(currency);
        let mut approved = Money::zero(currency);
        let mut paid = Money::zero(currency);
        let mut record_count = 0;

        for record in records {
            let bucket = match record.status {
                CommissionStatus::Pending => &mut pending,
                CommissionStatus::Approved => &mut approved,
                CommissionStatus::Paid => &mut paid,
            };
            *bucket = bucket.checked_add(&record.amount)?;
            record_count += 1;
        }

        let total = Money::sum(currency, [&pending, &approved, &paid])?;

        Ok(Self {
            agent_id,
            currency,
            total,
            pending,
            approved,
            paid,
            record_count,
        })
    }
}

/// Computes agent earnings from the commission ledger
pub struct EarningsAggregator {
    ledger: Arc<CommissionLedger>,
    currency: Currency,
}

impl EarningsAggregator {
    /// Sums in the ledger's operating currency
    pub fn new(ledger: Arc<CommissionLedger>) -> Self {
        let currency = ledger.currency();
        Self { ledger, currency }
    }

    #[instrument(skip_all, fields(agent_id = %agent_id))]
    pub async fn summarize(&self, agent_id: AgentId) -> Result<EarningsSummary, CommissionError> {
        let records = self.ledger.list_by_agent(agent_id, None).await?;
        EarningsSummary::from_records(agent_id, self.currency, &records)
    }

    /// Approved-but-unpaid commission available for payout
    pub async fn approved_balance(&self, agent_id: AgentId) -> Result<Money, CommissionError> {
        Ok(self.summarize(agent_id).await?.approved)
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}
