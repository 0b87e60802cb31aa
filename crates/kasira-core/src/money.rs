//! # Money Module
//!
//! Fixed-point monetary values and percentage discounts.
//!
//! ## Why Integer Money?
//! `0.1 + 0.2 = 0.30000000000000004` in floating point. Every monetary value
//! in the system is therefore an integer number of minor currency units, and
//! percentage discounts are integer basis points. The only place a float may
//! appear is a display-layer conversion that never feeds back into storage.
//!
//! ## Usage
//! ```rust
//! use kasira_core::money::{DiscountRate, Money};
//!
//! let unit_price = Money::from_minor(10_000);
//! let gross = unit_price * 3;                     // 30,000
//! let rate = DiscountRate::from_percent_hundredths(1000); // 10.00%
//! let discount = gross.discount_part(rate);       // 3,000
//! assert_eq!((gross - discount).minor(), 27_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for corrections and reversals
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Serde transparent**: serializes as a bare integer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the discount portion of this amount at the given rate.
    ///
    /// Uses i128 intermediates to prevent overflow and rounds half away from
    /// zero: `(amount * bps + 5_000) / 10_000`.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::{DiscountRate, Money};
    ///
    /// let gross = Money::from_minor(30_000);
    /// let rate = DiscountRate::from_percent_hundredths(1000); // 10.00%
    /// assert_eq!(gross.discount_part(rate).minor(), 3_000);
    /// ```
    pub fn discount_part(&self, rate: DiscountRate) -> Money {
        let amount = (self.0 as i128 * rate.basis_points() as i128 + 5_000) / 10_000;
        Money(amount as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug-oriented display; currency formatting belongs to the
        // export/formatting layer.
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// A percentage discount in basis points (1 bp = 0.01%).
///
/// `1000` basis points = 10.00%. The valid range is 0..=10_000 (0%..=100%),
/// enforced by the constructor — both sale and purchase lines use the same
/// bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Maximum representable rate: 100% in basis points.
    pub const MAX_BASIS_POINTS: u32 = 10_000;

    /// Creates a discount rate from basis points, validating the 0..=10_000
    /// range.
    pub fn new(basis_points: u32) -> Result<Self, ValidationError> {
        if basis_points > Self::MAX_BASIS_POINTS {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: Self::MAX_BASIS_POINTS as i64,
            });
        }
        Ok(DiscountRate(basis_points))
    }

    /// Creates a rate from hundredths of a percent (same scale as basis
    /// points; named for call-site clarity).
    pub fn from_percent_hundredths(hundredths: u32) -> Self {
        DiscountRate(hundredths.min(Self::MAX_BASIS_POINTS))
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// The rate in basis points.
    #[inline]
    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Whether this is a zero discount.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(10_000);
        assert_eq!(money.minor(), 10_000);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1_000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1_500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3_000);
    }

    #[test]
    fn test_discount_part_exact() {
        // 10% of 30,000 = 3,000
        let gross = Money::from_minor(30_000);
        let rate = DiscountRate::new(1_000).unwrap();
        assert_eq!(gross.discount_part(rate).minor(), 3_000);
    }

    #[test]
    fn test_discount_part_rounds() {
        // 12.5% of 999 = 124.875 → rounds to 125
        let gross = Money::from_minor(999);
        let rate = DiscountRate::new(1_250).unwrap();
        assert_eq!(gross.discount_part(rate).minor(), 125);
    }

    #[test]
    fn test_discount_rate_bounds() {
        assert!(DiscountRate::new(0).is_ok());
        assert!(DiscountRate::new(10_000).is_ok());
        assert!(DiscountRate::new(10_001).is_err());
    }

    #[test]
    fn test_full_discount() {
        let gross = Money::from_minor(5_000);
        let rate = DiscountRate::new(10_000).unwrap();
        assert_eq!(gross.discount_part(rate), gross);
    }

    #[test]
    fn test_zero_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::from_minor(1).is_zero());
        assert!(Money::from_minor(-1).is_negative());
        assert!(DiscountRate::zero().is_zero());
    }
}
