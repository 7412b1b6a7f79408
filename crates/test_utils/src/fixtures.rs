//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the commission engine. These fixtures
//! are consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{
    AgentId, ApplicationId, CourseId, Currency, Money, UniversityId, UserId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard tuition base for percentage rules
    pub fn tuition_usd() -> Money {
        Money::new(dec!(12000.00), Currency::USD)
    }

    /// A round base that makes percentage results easy to read
    pub fn usd_1000() -> Money {
        Money::new(dec!(1000.00), Currency::USD)
    }

    pub fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Creates a EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic agent ID for testing
    pub fn agent_id() -> AgentId {
        AgentId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Creates a deterministic university ID for testing
    pub fn university_id() -> UniversityId {
        UniversityId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Creates a deterministic course ID for testing
    pub fn course_id() -> CourseId {
        CourseId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }

    /// Creates a deterministic administrator ID for testing
    pub fn admin_id() -> UserId {
        UserId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }

    /// Fresh application ID; every commission needs its own
    pub fn application_id() -> ApplicationId {
        ApplicationId::new()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of the standard intake
    pub fn intake_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    }

    /// Timestamp inside the intake
    pub fn mid_intake() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 15).unwrap()
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn payment_reference() -> &'static str {
        "TXN-2026-000001"
    }

    pub fn rejection_reason() -> &'static str {
        "Bank details not verified"
    }
}
