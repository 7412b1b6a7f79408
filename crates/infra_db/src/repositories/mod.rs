//! Repository implementations for the engine's tables
//!
//! Repositories own the SQL and the mapping between rows and domain types.
//! They return [`DatabaseError`](crate::DatabaseError); translation into
//! port errors happens in [`crate::adapters`].
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` row
//! types, so the crate builds without a live database.

pub mod rules;
pub mod records;
pub mod payouts;

pub use rules::{RuleRepository, RuleRow};
pub use records::{RecordRepository, RecordRow};
pub use payouts::{PayoutRepository, PayoutRow};
