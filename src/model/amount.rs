//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`, parses values that may or may
//! not include a dollar sign and commas, and displays them as `$1,234.50`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Represents a dollar amount.
///
/// In storage an `Amount` is written as a plain decimal string (e.g. `"5420.50"`) and it can be
/// read from either a string or a JSON number. For people it is displayed with a dollar sign,
/// thousands separators and two decimal places.
///
/// # Examples
///
/// ```
/// # use savings_admin::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-$1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "-$1,250.50");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// The largest amount accepted for a single entry: a balance, a saving amount or a
    /// transaction. One trillion dollars.
    pub const LIMIT: Amount = Amount(Decimal::from_parts(3_567_587_328, 232, 0, false, 0));

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Amount {
        Amount(self.0.abs())
    }

    /// True when the magnitude of the amount does not exceed `Amount::LIMIT`.
    pub fn within_limit(&self) -> bool {
        self.0.abs() <= Self::LIMIT.0
    }

    /// `None` if the sum does not fit in a `Decimal`.
    pub fn checked_add(&self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// `None` if the difference does not fit in a `Decimal`.
    pub fn checked_sub(&self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// `None` if the product does not fit in a `Decimal`.
    pub fn checked_mul(&self, factor: Decimal) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }

    /// Rounds half away from zero to cents, which is how the amount is displayed.
    pub fn round_cents(&self) -> Amount {
        Amount(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AmountError({:?}, {:?})", self.input, self.source)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount: {}", self.input, self.source)
    }
}

impl Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // "-$50.00", "$50.00", "-50.00" and "50.00" are all accepted
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.strip_prefix('$') {
                Some(after_dollar) => format!("-{after_dollar}"),
                None => trimmed.to_string(),
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        let without_commas = without_dollar.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(|source| AmountError {
            input: s.to_string(),
            source,
        })?;
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = self.round_cents();
        let sign = if rounded.is_negative() { "-" } else { "" };
        let num = rounded.value().abs();
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

// The operators saturate at the `Decimal` bounds. Anything that is stored goes through
// `checked_add` or `checked_sub` instead.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        let amount = Amount::from_str("$50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        let amount = Amount::from_str("-$50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_with_commas_and_whitespace() {
        let amount = Amount::from_str("  $1,234,567.89 ").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_rejects_garbage_and_empty() {
        assert!(Amount::from_str("abc").is_err());
        assert!(Amount::from_str("").is_err());
        let e = Amount::from_str("12x").unwrap_err();
        assert!(e.to_string().contains("'12x'"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(dec("5420.5")).to_string(), "$5,420.50");
        assert_eq!(Amount::new(dec("-120.50")).to_string(), "-$120.50");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
        assert_eq!(Amount::new(dec("0.004")).to_string(), "$0.00");
        assert_eq!(Amount::new(dec("1000000")).to_string(), "$1,000,000.00");
    }

    #[test]
    fn test_serialize_as_decimal_string() {
        let amount = Amount::new(dec("120.50"));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"120.50\"");
    }

    #[test]
    fn test_deserialize_from_number_or_string() {
        let a: Amount = serde_json::from_str("5420.5").unwrap();
        assert_eq!(a.value(), dec("5420.5"));
        let b: Amount = serde_json::from_str("\"250\"").unwrap();
        assert_eq!(b.value(), dec("250"));
        let c: Amount = serde_json::from_str("1000").unwrap();
        assert_eq!(c.value(), dec("1000"));
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Amount::from_str("0.01").unwrap().is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
        assert!(Amount::from_str("-0.01").unwrap().is_negative());
    }

    #[test]
    fn test_limit() {
        assert_eq!(Amount::LIMIT, Amount::from_str("1000000000000").unwrap());
        assert!(Amount::LIMIT.within_limit());
        assert!((-Amount::LIMIT).within_limit());
        assert!(!Amount::from_str("1000000000000.01").unwrap().within_limit());
    }

    #[test]
    fn test_overflow_does_not_panic() {
        let max = Amount::new(Decimal::MAX);
        let one = Amount::from_str("1").unwrap();
        assert_eq!(max.checked_add(one), None);
        assert_eq!((-max).checked_sub(one), None);
        assert_eq!(max.checked_mul(Decimal::TWO), None);
        assert_eq!(max.checked_add(-one), Some(Amount::new(Decimal::MAX - Decimal::ONE)));
        assert_eq!(max + one, max);
        assert_eq!(-max - one, -max);
        let total: Amount = [max, max].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_arithmetic() {
        let mut a = Amount::from_str("100").unwrap();
        a += Amount::from_str("50.25").unwrap();
        a -= Amount::from_str("0.25").unwrap();
        assert_eq!(a.value(), dec("150"));
        let total: Amount = [a, -a, a].iter().sum();
        assert_eq!(total, a);
    }
}
