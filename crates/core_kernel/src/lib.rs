//! Core Kernel - Foundational types and utilities for the agency commission system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for agents, enrollments, rules, and payouts
//! - Port infrastructure shared by every adapter
//! - The audit collaborator port

pub mod money;
pub mod identifiers;
pub mod ports;
pub mod audit;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    IdParseError,
    AgentId, ApplicationId, CourseId, UniversityId, UserId,
    CommissionRuleId, CommissionRecordId, PayoutId, AuditEventId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use audit::{Actor, AuditEntry, AuditSink, TracingAuditSink, MemoryAuditSink, report};
