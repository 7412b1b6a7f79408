//! PostgreSQL advisory locks for strict consistency
//!
//! Each agent maps to a 64-bit advisory lock key. The lock is taken with
//! `pg_advisory_lock` on a pooled connection that the guard holds until it
//! is dropped, so every engine instance sharing the database serializes on
//! the same key.
//!
//! Give this adapter its own pool. Sharing the store pool lets lock holders
//! exhaust it while the sequences they guard wait for a connection.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

use core_kernel::{AgentId, DomainPort, PortError};
use domain_commission::{AgentLockGuard, AgentLocks};

use crate::error::DatabaseError;

/// Namespaces agent keys away from other advisory lock users
const AGENT_LOCK_NAMESPACE: i64 = 0x4147_454E_5400_0000;

/// Advisory lock key for an agent
pub fn advisory_key(agent_id: AgentId) -> i64 {
    let bytes = agent_id.as_uuid().as_bytes();
    let mut high = [0u8; 8];
    let mut low = [0u8; 8];
    high.copy_from_slice(&bytes[..8]);
    low.copy_from_slice(&bytes[8..]);
    i64::from_be_bytes(high) ^ i64::from_be_bytes(low) ^ AGENT_LOCK_NAMESPACE
}

/// `AgentLocks` adapter backed by session-level advisory locks
#[derive(Debug, Clone)]
pub struct PostgresAgentLocks {
    pool: PgPool,
}

impl PostgresAgentLocks {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresAgentLocks {}

#[async_trait]
impl AgentLocks for PostgresAgentLocks {
    #[instrument(skip_all, fields(agent_id = %agent_id))]
    async fn lock(&self, agent_id: AgentId) -> Result<AgentLockGuard, PortError> {
        let key = advisory_key(agent_id);
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;

        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(key)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::from)?;

        debug!(key, "Advisory lock acquired");
        Ok(AgentLockGuard::new(agent_id, AdvisoryLock { conn: Some(conn), key }))
    }
}

/// Holds the locking connection; unlocks when dropped
struct AdvisoryLock {
    conn: Option<PoolConnection<Postgres>>,
    key: i64,
}

impl Drop for AdvisoryLock {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };
        let key = self.key;

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let unlocked = sqlx::query("SELECT pg_advisory_unlock($1)")
                        .bind(key)
                        .execute(&mut *conn)
                        .await;
                    if let Err(e) = unlocked {
                        warn!(key, error = %e, "Advisory unlock failed, closing connection");
                        // closing the session releases the lock
                        drop(conn.detach());
                    }
                });
            }
            Err(_) => {
                // no runtime to unlock on; the session must not go back to the pool
                drop(conn.detach());
            }
        }
    }
}
