//! Commission Domain
//!
//! This crate decides what an agent is owed for an enrollment and tracks each
//! owed amount until it is settled by a payout.
//!
//! # Rule Precedence
//!
//! ```text
//! 1. agent + course        (university ignored)
//! 2. agent + university    (no course)
//! 3. course default        (no agent)
//! 4. university default    (no agent, no course)
//! ```
//!
//! The first tier with an active matching rule wins. Ties inside a tier go to
//! the earliest-created rule.
//!
//! # Commission Lifecycle
//!
//! ```text
//! Pending -> Approved -> Paid
//! ```
//!
//! Transitions are forward-only. `Paid` is reached only through the bulk
//! settlement performed when a payout is approved.

pub mod rule;
pub mod record;
pub mod ports;
pub mod resolver;
pub mod ledger;
pub mod earnings;
pub mod catalog;
pub mod memory;
pub mod error;

pub use rule::{CommissionRule, RuleKind, RuleScope, RuleTier};
pub use record::{CommissionRecord, CommissionStatus};
pub use ports::{
    RuleStore, RuleFilter, CommissionRecordStore, AgentLocks, AgentLockGuard,
    ConsistencyMode,
};
pub use resolver::{CommissionRuleResolver, EnrollmentContext, Resolution, select_rule};
pub use ledger::{CommissionLedger, NewCommission};
pub use earnings::{EarningsAggregator, EarningsSummary};
pub use catalog::{RuleCatalog, NewRule};
pub use memory::{InMemoryRuleStore, InMemoryCommissionRecordStore, LocalAgentLocks};
pub use error::CommissionError;
