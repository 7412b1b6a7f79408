//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful failure
//! messages than plain `assert_eq!`.

use core_kernel::Money;
use domain_commission::EarningsSummary;
use rust_decimal::Decimal;

/// Asserts that a Money value has the expected amount (scale-insensitive)
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts `total == pending + approved + paid`
pub fn assert_summary_consistent(summary: &EarningsSummary) {
    let parts = summary
        .pending
        .checked_add(&summary.approved)
        .and_then(|m| m.checked_add(&summary.paid))
        .expect("summary buckets use different currencies");
    assert_eq!(
        summary.total, parts,
        "Earnings total {} does not equal pending {} + approved {} + paid {}",
        summary.total, summary.pending, summary.approved, summary.paid
    );
}

/// Asserts the approved and paid buckets of a summary
pub fn assert_balances(summary: &EarningsSummary, approved: Decimal, paid: Decimal) {
    assert_summary_consistent(summary);
    assert_money_eq(&summary.approved, approved);
    assert_money_eq(&summary.paid, paid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{AgentId, Currency};
    use domain_commission::CommissionRecord;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_eq_ignores_scale() {
        assert_money_eq(&Money::new(dec!(150.00), Currency::USD), dec!(150));
    }

    #[test]
    #[should_panic(expected = "Money amount mismatch")]
    fn test_assert_money_eq_panics() {
        assert_money_eq(&Money::new(dec!(1), Currency::USD), dec!(2));
    }

    #[test]
    fn test_empty_summary_is_consistent() {
        let summary =
            EarningsSummary::from_records(AgentId::new(), Currency::USD, &Vec::<CommissionRecord>::new()).unwrap();
        assert_summary_consistent(&summary);
        assert_money_zero(&summary.total);
    }
}
