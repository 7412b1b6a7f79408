//! Domain Adapters
//!
//! Implementations of the commission and payout ports over PostgreSQL.
//!
//! Each adapter:
//! - Implements the domain's port trait
//! - Delegates SQL to the repository layer
//! - Translates `DatabaseError` into `PortError`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresRuleStore;
//! use domain_commission::{CommissionRuleResolver, RuleStore};
//! use std::sync::Arc;
//!
//! let rules: Arc<dyn RuleStore> = Arc::new(PostgresRuleStore::new(pool));
//! let resolver = CommissionRuleResolver::new(rules);
//! ```

use std::time::Instant;

use sqlx::PgPool;

use core_kernel::HealthCheckResult;

pub mod commission;
pub mod payout;
pub mod locks;

pub use commission::{PostgresCommissionRecordStore, PostgresRuleStore};
pub use payout::PostgresPayoutStore;
pub use locks::PostgresAgentLocks;

/// Runs `SELECT 1` against the pool and reports the latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::measured(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {e}")),
    }
}
