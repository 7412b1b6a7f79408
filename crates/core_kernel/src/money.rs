//! Money and rates
//!
//! Amounts are `rust_decimal` values tagged with a currency. Arithmetic
//! across currencies is refused rather than converted: the engine books in a
//! single configured currency and a mismatch means bad input.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Booking currencies, ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    AUD,
    CAD,
    NZD,
    INR,
    SGD,
    JPY,
}

impl Currency {
    pub const ALL: [Currency; 9] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::AUD,
        Currency::CAD,
        Currency::NZD,
        Currency::INR,
        Currency::SGD,
        Currency::JPY,
    ];

    /// (ISO code, symbol, minor-unit places)
    fn traits(&self) -> (&'static str, &'static str, u32) {
        match self {
            Currency::USD => ("USD", "$", 2),
            Currency::EUR => ("EUR", "€", 2),
            Currency::GBP => ("GBP", "£", 2),
            Currency::AUD => ("AUD", "A$", 2),
            Currency::CAD => ("CAD", "C$", 2),
            Currency::NZD => ("NZD", "NZ$", 2),
            Currency::INR => ("INR", "₹", 2),
            Currency::SGD => ("SGD", "S$", 2),
            Currency::JPY => ("JPY", "¥", 0),
        }
    }

    pub fn code(&self) -> &'static str {
        self.traits().0
    }

    pub fn symbol(&self) -> &'static str {
        self.traits().1
    }

    /// Minor-unit places; payouts and commissions are rounded to this
    pub fn decimal_places(&self) -> u32 {
        self.traits().2
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    /// Case-insensitive ISO code; surrounding blanks are ignored, so a
    /// `CHAR(3)` column parses as-is
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| MoneyError::UnknownCurrency(code.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// An amount in one currency.
///
/// Kept at 4 decimal places; commission figures are rounded to 2 places
/// where they are computed, with [`Rate::apply_rounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Strictly above zero
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// True unless the amount is finer than the currency's minor unit
    pub fn fits_minor_units(&self) -> bool {
        self.amount.normalize().scale() <= self.currency.decimal_places()
    }

    /// Rounds half away from zero (0.125 -> 0.13, -0.125 -> -0.13)
    pub fn round_half_up(&self, dp: u32) -> Self {
        Self {
            amount: self
                .amount
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Sums a sequence of amounts, starting from zero in `currency`
    pub fn sum<'a, I>(currency: Currency, amounts: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

impl PartialOrd for Money {
    /// Amounts in different currencies are not comparable
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if self.currency != other.currency {
            return None;
        }
        self.amount.partial_cmp(&other.amount)
    }
}

/// A commission percentage, held as a fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.15 for 15%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a percentage (e.g., 15 for 15%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Applies this rate to a money amount and rounds half-up to `dp` places.
    ///
    /// The product is computed at full precision before the single rounding step.
    pub fn apply_rounded(&self, money: &Money, dp: u32) -> Money {
        let exact = money.amount() * self.value;
        Money::new(
            exact.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            money.currency(),
        )
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().round_dp(4))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_sum_is_order_independent(
            amounts in proptest::collection::vec(0i64..1_000_000_000i64, 0..20)
        ) {
            let forward: Vec<Money> = amounts
                .iter()
                .map(|a| Money::from_minor(*a, Currency::USD))
                .collect();
            let mut backward = forward.clone();
            backward.reverse();

            prop_assert_eq!(
                Money::sum(Currency::USD, &forward).unwrap(),
                Money::sum(Currency::USD, &backward).unwrap()
            );
        }

        #[test]
        fn rounded_rate_stays_within_half_a_cent(
            base in 0i64..100_000_000i64,
            pct in 0u32..10_000u32
        ) {
            let money = Money::from_minor(base, Currency::USD);
            let rate = Rate::from_percentage(Decimal::new(pct as i64, 2));
            let exact = money.amount() * rate.as_decimal();
            let rounded = rate.apply_rounded(&money, 2).amount();

            prop_assert!((rounded - exact).abs() <= dec!(0.005));
        }
    }
}
