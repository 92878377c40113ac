//! # Money Module
//!
//! Provides the `Money` type for parking charges, discounts and cash totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Tariffs, costs and discounts are whole numbers (3000 = one hour of   │
//! │    CAR parking at the fallback rate). Percentages are integer math.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lotkeeper_core::money::Money;
//!
//! let hour = Money::from_amount(3000);
//! let two_hours = hour * 2;
//! assert_eq!(two_hours.amount(), 6000);
//!
//! // A discount never pushes a charge below zero
//! let charged = hour.saturating_sub(Money::from_amount(5000));
//! assert!(charged.is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Tariff.base_price ──► Pricing Engine ──► calculated cost
///                                               │
///                       Discount Resolver ◄─────┘
///                               │
///                               ▼
///          ParkingSession.cost + Transaction.amount (same value)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use lotkeeper_core::money::Money;
    ///
    /// let price = Money::from_amount(15000);
    /// assert_eq!(price.amount(), 15000);
    /// ```
    #[inline]
    pub const fn from_amount(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the smaller of two values.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Clamps the value into `[0, ceiling]`.
    ///
    /// ## Example
    /// ```rust
    /// use lotkeeper_core::money::Money;
    ///
    /// let ceiling = Money::from_amount(4000);
    /// assert_eq!(Money::from_amount(9000).clamp_to(ceiling).amount(), 4000);
    /// assert_eq!(Money::from_amount(-10).clamp_to(ceiling).amount(), 0);
    /// ```
    pub fn clamp_to(self, ceiling: Money) -> Money {
        Money(self.0.max(0).min(ceiling.0.max(0)))
    }

    /// Subtracts without going below zero.
    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Takes a whole-number percentage of this value, truncating.
    ///
    /// ## Example
    /// ```rust
    /// use lotkeeper_core::money::Money;
    ///
    /// let cost = Money::from_amount(4500);
    /// assert_eq!(cost.percent(10).amount(), 450);
    /// assert_eq!(Money::from_amount(999).percent(50).amount(), 499);
    /// ```
    pub fn percent(&self, percent: i64) -> Money {
        // i128 so large lot totals cannot overflow
        let part = (self.0 as i128 * percent as i128) / 100;
        Money(part.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}", sign, self.0.abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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
        self.0 = self.0.saturating_add(other.0);
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
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by a unit count (hours, days, blocks). Saturates at the
/// `i64` bounds.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, units: i64) -> Self {
        Money(self.0.saturating_mul(units))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_amount(3000)), "$3000");
        assert_eq!(format!("{}", Money::from_amount(-550)), "-$550");
        assert_eq!(format!("{}", Money::zero()), "$0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_amount(1000);
        let b = Money::from_amount(500);

        assert_eq!((a + b).amount(), 1500);
        assert_eq!((a - b).amount(), 500);
        assert_eq!((a * 3).amount(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.amount(), 2000);
    }

    #[test]
    fn test_saturating_sub_never_negative() {
        let cost = Money::from_amount(2000);
        assert_eq!(cost.saturating_sub(Money::from_amount(2500)), Money::zero());
        assert_eq!(cost.saturating_sub(Money::from_amount(500)).amount(), 1500);
    }

    #[test]
    fn test_percent_truncates() {
        assert_eq!(Money::from_amount(3333).percent(10).amount(), 333);
        assert_eq!(Money::from_amount(10000).percent(100).amount(), 10000);
        assert_eq!(Money::from_amount(10000).percent(0).amount(), 0);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_amount(i64::MAX / 1000);
        assert_eq!((huge * 3000).amount(), i64::MAX);
        assert_eq!((Money::from_amount(i64::MAX) + Money::from_amount(1)).amount(), i64::MAX);
        assert_eq!((Money::from_amount(i64::MIN) - Money::from_amount(1)).amount(), i64::MIN);
        assert_eq!(Money::from_amount(i64::MAX).percent(200).amount(), i64::MAX);
    }

    #[test]
    fn test_min_and_clamp() {
        let a = Money::from_amount(8000);
        let b = Money::from_amount(10000);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
        assert_eq!(b.clamp_to(a), a);
    }
}
