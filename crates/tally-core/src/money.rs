//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A receipt has to reconcile to the cent with bookkeeping, and the       │
//! │  engine divides (discount ratios, VAT back-calculation) before it       │
//! │  rounds. Integer cents cannot hold 4.99 / 20 either.                    │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                          │
//! │    4.99 / 20 = 0.2495 exactly                                           │
//! │    Rounding happens once, at the edge, half-to-even                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line, Money::from_cents(3297));
//!
//! // Cash rounding to the nearest 0.05
//! let change = Money::from_cents(498);
//! assert_eq!(change.round_to_step(Money::from_cents(5)), Money::from_cents(500));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Decimal places of every persisted money field.
pub const MONEY_DECIMALS: u32 = 2;

/// Signed monetary value in major currency units.
///
/// ## Design Decisions
/// - **Signed**: returns, payouts and cancellations are negative amounts
/// - **Transparent serde**: a `Money` is a plain JSON number in records
/// - **No implicit rounding**: arithmetic is exact, callers decide where to round
/// - **Saturating**: `+`, `-`, `*` clamp at the `Decimal` bounds instead of
///   panicking, so an absurd `qty × price` in a record cannot abort a calculation
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero money value.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_DECIMALS))
    }

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    /// Checks if the value is zero.
    ///
    /// Also the "truthiness" test used for payment flags such as `withdrawel`.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to `dp` decimal places using Bankers Rounding (round half to even).
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  BANKERS ROUNDING (Round Half to Even)                              │
    /// │                                                                     │
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.5 → 1, 1.5 → 2, 2.5 → 3, 3.5 → 4 (always up = +bias)         │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::from_decimal(Decimal::new(2495, 3)); // 2.495
    /// assert_eq!(m.round_dp(2), Money::from_cents(250));
    /// ```
    #[inline]
    pub fn round_dp(self, dp: u32) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Rounds to the persisted precision (2 decimals, half-even).
    #[inline]
    pub fn rounded(self) -> Self {
        self.round_dp(MONEY_DECIMALS)
    }

    /// Rounds to the nearest multiple of `step`, half-to-even on the step count.
    ///
    /// A zero step leaves the value unchanged.
    ///
    /// ## User Workflow
    /// ```text
    /// Change due: 4.98 (cash-only sale)
    ///      │
    ///      ▼
    /// round_to_step(0.05) ← THIS FUNCTION
    ///      │   4.98 / 0.05 = 99.6 → 100 steps
    ///      ▼
    /// Change paid out: 5.00
    /// ```
    pub fn round_to_step(self, step: Money) -> Self {
        if step.is_zero() {
            return self;
        }
        let Some(steps) = self.0.checked_div(step.0) else {
            return self;
        };
        let steps = steps.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        Money(steps.saturating_mul(step.0))
    }

    /// Percent-scaled integer (×100, rounded half-even) used by legacy-ERP fields.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).percent_scaled(), 1099);
    /// assert_eq!(Money::from_cents(-550).percent_scaled(), -550);
    /// ```
    pub fn percent_scaled(self) -> i64 {
        let scaled = self
            .0
            .saturating_mul(Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        // Saturates outside the i64 range.
        scaled.to_i64().unwrap_or(if scaled.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(-2), Money::from_cents(-598));
    /// ```
    #[inline]
    pub fn multiply_quantity(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(Decimal::from(qty)))
    }

    /// Multiplies money by an exact factor (discount fractions, VAT shares).
    #[inline]
    pub fn scale(self, factor: Decimal) -> Self {
        Money(self.0.saturating_mul(factor))
    }

    /// Divides by another amount, yielding 0 when the divisor is zero.
    ///
    /// Division by zero in the discount-factor formulas is defined behaviour.
    pub fn ratio_to(self, divisor: Money) -> Decimal {
        self.0.checked_div(divisor.0).unwrap_or(Decimal::ZERO)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering, e.g. `-5.50`.
///
/// ## Note
/// For debugging and CLI output. Documents localise on their own.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Decimal) -> Self {
        self.scale(factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), dec!(10.99));
        assert_eq!(Money::from_cents(-550).amount(), dec!(-5.50));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::ZERO), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a + b, Money::from_cents(1500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!(-a, Money::from_cents(-1000));
        assert_eq!(a * 3, Money::from_cents(3000));
        assert_eq!(a * dec!(0.25), Money::from_cents(250));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(Money::from(dec!(2.495)).round_dp(2), Money::from(dec!(2.50)));
        assert_eq!(Money::from(dec!(2.485)).round_dp(2), Money::from(dec!(2.48)));
        assert_eq!(Money::from(dec!(-2.485)).round_dp(2), Money::from(dec!(-2.48)));
        assert_eq!(Money::from(dec!(20.0004)).round_dp(3), Money::from(dec!(20.000)));
    }

    #[test]
    fn test_round_to_nickel() {
        let step = Money::from_cents(5);
        assert_eq!(Money::from_cents(498).round_to_step(step), Money::from_cents(500));
        assert_eq!(Money::from_cents(497).round_to_step(step), Money::from_cents(495));
        assert_eq!(Money::from_cents(-498).round_to_step(step), Money::from_cents(-500));
        // Exact midpoint: 0.025 / 0.05 = 0.5 steps → 0 (even)
        assert_eq!(Money::from(dec!(0.025)).round_to_step(step), Money::ZERO);
        // 0.075 / 0.05 = 1.5 steps → 2 (even)
        assert_eq!(Money::from(dec!(0.075)).round_to_step(step), Money::from_cents(10));
    }

    #[test]
    fn test_round_to_zero_step_is_identity() {
        let m = Money::from_cents(498);
        assert_eq!(m.round_to_step(Money::ZERO), m);
    }

    #[test]
    fn test_percent_scaled() {
        assert_eq!(Money::from_cents(3575).percent_scaled(), 3575);
        assert_eq!(Money::from(dec!(0.005)).percent_scaled(), 0);
        assert_eq!(Money::from(dec!(0.015)).percent_scaled(), 2);
        assert_eq!(Money::from(dec!(-7.84)).percent_scaled(), -784);
    }

    #[test]
    fn test_ratio_to_zero_divisor() {
        let discount = Money::from_cents(499);
        assert_eq!(discount.ratio_to(Money::ZERO), Decimal::ZERO);
        assert_eq!(discount.ratio_to(Money::from_cents(2000)), dec!(0.2495));
    }

    #[test]
    fn test_arithmetic_saturates_at_bounds() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max.multiply_quantity(1_000), max);
        assert_eq!(max.multiply_quantity(-2), Money::from_decimal(Decimal::MIN));
        assert_eq!(max + Money::from_cents(100), max);
        assert_eq!(-max - Money::from_cents(100), Money::from_decimal(Decimal::MIN));
        assert_eq!(max.scale(dec!(2)), max);
        assert_eq!(max.percent_scaled(), i64::MAX);

        let mut total = max;
        total += max;
        assert_eq!(total, max);
    }

    #[test]
    fn test_serde_as_number() {
        let m: Money = serde_json::from_str("10.24").unwrap();
        assert_eq!(m, Money::from_cents(1024));
        let json = serde_json::to_string(&Money::from_cents(-784)).unwrap();
        assert_eq!(json, "-7.84");
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(1), Money::from_cents(2), Money::from_cents(4)]
            .iter()
            .sum();
        assert_eq!(total, Money::from_cents(7));
    }
}
