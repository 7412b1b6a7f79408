//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating test data that respects
//! domain invariants.

use core_kernel::{Currency, Money};
use domain_commission::{RuleKind, RuleTier};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for positive USD amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for positive USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for percentages between 0% and 100% with two decimal places
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..=10_000u32).prop_map(|n| Decimal::new(n as i64, 2))
}

/// Strategy for flat commission amounts up to 50,000.00
pub fn flat_amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

pub fn rule_tier_strategy() -> impl Strategy<Value = RuleTier> {
    prop::sample::select(RuleTier::ORDERED.to_vec())
}

/// Strategy for valid (kind, value) pricing pairs
pub fn pricing_strategy() -> impl Strategy<Value = (RuleKind, Decimal)> {
    prop_oneof![
        percentage_strategy().prop_map(|v| (RuleKind::Percentage, v)),
        flat_amount_strategy().prop_map(|v| (RuleKind::Flat, v)),
    ]
}
