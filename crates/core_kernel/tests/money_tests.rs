//! Unit tests for the Money module
//!
//! Tests cover money creation, checked arithmetic, half-up rounding used for
//! commission amounts, percentage rates, and currency handling.

use core_kernel::{Money, Currency, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_from_minor_handles_jpy_no_decimals() {
        let m = Money::from_minor(10000, Currency::JPY);
        assert_eq!(m.amount(), dec!(10000));
    }

    #[test]
    fn test_zero_is_neither_positive_nor_negative() {
        let m = Money::zero(Currency::AUD);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert!(!m.is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::USD);
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(150.00));
    }

    #[test]
    fn test_checked_sub_can_go_negative() {
        let a = Money::new(dec!(30.00), Currency::USD);
        let b = Money::new(dec!(100.00), Currency::USD);
        assert_eq!(a.checked_sub(&b).unwrap().amount(), dec!(-70.00));
    }

    #[test]
    fn test_checked_sub_currency_mismatch() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::GBP);
        assert!(matches!(a.checked_sub(&b), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_sum_of_empty_sequence_is_zero() {
        let total = Money::sum(Currency::USD, &Vec::<Money>::new()).unwrap();
        assert_eq!(total, Money::zero(Currency::USD));
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let amounts = vec![
            Money::new(dec!(10), Currency::USD),
            Money::new(dec!(10), Currency::EUR),
        ];
        assert!(Money::sum(Currency::USD, &amounts).is_err());
    }

    #[test]
    fn test_ordering_within_currency() {
        let small = Money::new(dec!(500), Currency::USD);
        let large = Money::new(dec!(600), Currency::USD);
        assert!(large > small);
        assert!(small >= Money::new(dec!(500.00), Currency::USD));
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round_half_up_rounds_midpoint_away_from_zero() {
        assert_eq!(Money::new(dec!(2.345), Currency::USD).round_half_up(2).amount(), dec!(2.35));
        assert_eq!(Money::new(dec!(2.355), Currency::USD).round_half_up(2).amount(), dec!(2.36));
        assert_eq!(Money::new(dec!(-2.345), Currency::USD).round_half_up(2).amount(), dec!(-2.35));
    }

    #[test]
    fn test_round_half_up_leaves_exact_values() {
        let m = Money::new(dec!(150.00), Currency::USD).round_half_up(2);
        assert_eq!(m.amount(), dec!(150.00));
    }
}

mod rate {
    use super::*;

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(dec!(15));
        assert_eq!(rate.as_decimal(), dec!(0.15));
        assert_eq!(rate.as_percentage(), dec!(15));
    }

    #[test]
    fn test_fifteen_percent_of_thousand() {
        let rate = Rate::from_percentage(dec!(15));
        let base = Money::new(dec!(1000), Currency::USD);
        assert_eq!(rate.apply_rounded(&base, 2).amount(), dec!(150.00));
    }

    #[test]
    fn test_apply_rounded_is_single_rounding() {
        // 7.5% of 33.33 = 2.49975 -> 2.50
        let rate = Rate::from_percentage(dec!(7.5));
        let base = Money::new(dec!(33.33), Currency::USD);
        assert_eq!(rate.apply_rounded(&base, 2).amount(), dec!(2.50));
    }

    #[test]
    fn test_rate_display() {
        assert!(Rate::from_percentage(dec!(12.5)).to_string().starts_with("12.5"));
    }
}

mod currency {
    use super::*;

    #[test]
    fn test_currency_round_trip_through_code() {
        for currency in [Currency::USD, Currency::AUD, Currency::GBP, Currency::JPY] {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn test_unknown_currency() {
        assert_eq!(
            "BTC".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency("BTC".to_string()))
        );
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(dec!(1234.5), Currency::USD).to_string(), "$ 1234.50");
        assert_eq!(Money::new(dec!(1000), Currency::JPY).to_string(), "¥ 1000");
    }

    #[test]
    fn test_money_json_roundtrip() {
        let m = Money::new(dec!(500.00), Currency::AUD);
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
