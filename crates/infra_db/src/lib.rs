//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the commission engine using SQLx: connection
//! pooling, embedded migrations, repositories for rules, commission records
//! and payout requests, and the adapters that plug them into the domain
//! ports.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{connect_and_migrate, DatabaseConfig, PostgresCommissionRecordStore};
//!
//! let pool = connect_and_migrate(&DatabaseConfig::new("postgres://localhost/commissions")).await?;
//! let records = PostgresCommissionRecordStore::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{connect_and_migrate, create_pool, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
pub use error::DatabaseError;
pub use adapters::{
    PostgresAgentLocks, PostgresCommissionRecordStore, PostgresPayoutStore, PostgresRuleStore,
};
