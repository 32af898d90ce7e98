use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A monetary value with exactly two decimal places.
///
/// This is a wrapper around `rust_decimal::Decimal` that keeps every amount
/// quantized to the cent. Arithmetic between already-quantized values stays
/// exact; any value produced by multiplication or division must come back in
/// through one of the explicit rounding constructors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// One cent, the smallest allocatable unit.
    pub fn cent() -> Self {
        Self(Decimal::new(1, 2))
    }

    /// Wraps a decimal that is already cent-quantized.
    pub fn new(value: Decimal) -> Self {
        Self(value.normalize())
    }

    /// Quantizes toward negative infinity.
    pub fn floor(value: Decimal) -> Self {
        Self::round(value, RoundingStrategy::ToNegativeInfinity)
    }

    /// Quantizes toward positive infinity.
    pub fn ceil(value: Decimal) -> Self {
        Self::round(value, RoundingStrategy::ToPositiveInfinity)
    }

    /// Quantizes with banker's rounding.
    pub fn half_even(value: Decimal) -> Self {
        Self::round(value, RoundingStrategy::MidpointNearestEven)
    }

    fn round(value: Decimal, strategy: RoundingStrategy) -> Self {
        Self(value.round_dp_with_strategy(2, strategy).normalize())
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    /// Always renders with cents, e.g. `12.30`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounding_strategies() {
        assert_eq!(Money::floor(dec!(1.019)), Money::new(dec!(1.01)));
        assert_eq!(Money::ceil(dec!(1.011)), Money::new(dec!(1.02)));
        // Banker's rounding: midpoints go to the even cent.
        assert_eq!(Money::half_even(dec!(1.015)), Money::new(dec!(1.02)));
        assert_eq!(Money::half_even(dec!(1.025)), Money::new(dec!(1.02)));
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = Money::new(dec!(0.1));
        let b = Money::new(dec!(0.2));
        assert_eq!(a + b, Money::new(dec!(0.3)));
        assert_eq!(b - a, Money::new(dec!(0.1)));

        let total: Money = vec![a, b, Money::cent()].into_iter().sum();
        assert_eq!(total, Money::new(dec!(0.31)));
    }

    #[test]
    fn test_normalized_equality() {
        // 1.50 and 1.5 are the same amount.
        assert_eq!(Money::new(dec!(1.50)), Money::new(dec!(1.5)));
    }

    #[test]
    fn test_display_always_shows_cents() {
        assert_eq!(Money::new(dec!(5)).to_string(), "5.00");
        assert_eq!(Money::new(dec!(5.1)).to_string(), "5.10");
        assert_eq!(Money::new(dec!(5.25)).to_string(), "5.25");
    }

    #[test]
    fn test_ordering() {
        let a = Money::new(dec!(1.00));
        let b = Money::new(dec!(2.00));
        assert!(a < b);
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }
}
