//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  GST on ₹99.99 × 3 at 18% summed over 40 lines drifts by a paisa or    │
//! │  two, and then CGST + SGST no longer add up to the printed total.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise (1 rupee = 100 paise)                      │
//! │    9999 paise × 3 = 29997 paise, exactly                               │
//! │    Rounding happens once per line, half-up, in integer math            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gstease_core::money::Money;
//!
//! let price = Money::from_paise(10_050); // ₹100.50
//! let line = price * 2;                  // ₹201.00
//! assert_eq!(line.paise(), 20_100);
//! assert_eq!(line.to_string(), "₹201.00");
//! ```
//!
//! At the HTTP edge amounts travel as decimal strings (`"201.00"`);
//! [`Money::from_decimal`] and [`Money::to_decimal`] convert at that boundary
//! and nowhere else.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::GstRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Where Money is Used
/// ```text
/// Product.price_paise ──► InvoiceItem.price ──► price × qty ──► subtotal
///                                                   │
///                                                   ▼
///                                 apply_rate(gst_rate) = line GST
///                                                   │
///                                                   ▼
///                          Σ line GST ──► CGST/SGST or IGST ──► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use gstease_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    ///
    /// ## Example
    /// ```rust
    /// use gstease_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1099).rupees(), 10);
    /// assert_eq!(Money::from_paise(-550).rupees(), -5);
    /// ```
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a GST rate with half-up rounding to the nearest paisa.
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`. The +5000 is half of
    /// the divisor, so anything at or above half a paisa rounds up.
    ///
    /// ## Example
    /// ```rust
    /// use gstease_core::money::Money;
    /// use gstease_core::types::GstRate;
    ///
    /// // ₹0.25 at 18% = 4.5 paise → 5 paise
    /// let gst = Money::from_paise(25).apply_rate(GstRate::from_bps(1800));
    /// assert_eq!(gst.paise(), 5);
    /// ```
    ///
    /// Callers pass non-negative amounts only; the tax calculator validates
    /// prices before getting here.
    pub fn apply_rate(&self, rate: GstRate) -> Money {
        let paise = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(paise as i64)
    }

    /// Splits an amount into two equal halves, rounding half-up.
    ///
    /// ## Example
    /// ```rust
    /// use gstease_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(3600).half_up().paise(), 1800);
    /// assert_eq!(Money::from_paise(3601).half_up().paise(), 1801);
    /// ```
    #[inline]
    pub const fn half_up(&self) -> Money {
        Money((self.0 + 1) / 2)
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Converts a decimal rupee amount (as received over HTTP) into paise.
    ///
    /// ## Rules
    /// - At most two fractional digits (`"10.999"` is rejected, not rounded)
    /// - Must fit in i64 paise
    ///
    /// ## Example
    /// ```rust
    /// use gstease_core::money::Money;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let m = Money::from_decimal("price", Decimal::from_str("236.5").unwrap()).unwrap();
    /// assert_eq!(m.paise(), 23_650);
    /// ```
    pub fn from_decimal(field: &str, value: Decimal) -> Result<Money, ValidationError> {
        if value.normalize().scale() > 2 {
            return Err(ValidationError::invalid_format(
                field,
                "must have at most 2 decimal places",
            ));
        }

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|p| p.to_i64())
            .map(Money::from_paise)
            .ok_or_else(|| ValidationError::invalid_format(field, "amount is too large"))
    }

    /// Converts paise back into a two-decimal rupee amount.
    ///
    /// ```rust
    /// use gstease_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(23_600).to_decimal().to_string(), "236.00");
    /// ```
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable rupee format, for logs and email bodies.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
        assert_eq!(Money::from_rupees(236).paise(), 23_600);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_paise(500).to_string(), "₹5.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // ₹200.00 at 18% = ₹36.00
        assert_eq!(
            Money::from_paise(20_000).apply_rate(GstRate::from_bps(1800)).paise(),
            3_600
        );
        // 25 paise at 18% = 4.5 → 5
        assert_eq!(Money::from_paise(25).apply_rate(GstRate::from_bps(1800)).paise(), 5);
        // 10 paise at 12% = 1.2 → 1
        assert_eq!(Money::from_paise(10).apply_rate(GstRate::from_bps(1200)).paise(), 1);
        // 0% is always zero
        assert!(Money::from_paise(99_999).apply_rate(GstRate::zero()).is_zero());
    }

    #[test]
    fn test_half_up() {
        assert_eq!(Money::from_paise(0).half_up().paise(), 0);
        assert_eq!(Money::from_paise(1).half_up().paise(), 1);
        assert_eq!(Money::from_paise(3600).half_up().paise(), 1800);
        assert_eq!(Money::from_paise(3601).half_up().paise(), 1801);
    }

    #[test]
    fn test_checked_mul_quantity_overflow() {
        assert_eq!(
            Money::from_paise(299).checked_mul_quantity(3),
            Some(Money::from_paise(897))
        );
        assert_eq!(Money::from_paise(i64::MAX).checked_mul_quantity(2), None);
    }

    #[test]
    fn test_decimal_conversion() {
        let d = Decimal::from_str("100").unwrap();
        assert_eq!(Money::from_decimal("price", d).unwrap().paise(), 10_000);

        let d = Decimal::from_str("99.90").unwrap();
        assert_eq!(Money::from_decimal("price", d).unwrap().paise(), 9_990);

        // Trailing zeros beyond two places are fine
        let d = Decimal::from_str("1.500").unwrap();
        assert_eq!(Money::from_decimal("price", d).unwrap().paise(), 150);

        let d = Decimal::from_str("1.005").unwrap();
        assert!(matches!(
            Money::from_decimal("price", d),
            Err(ValidationError::InvalidFormat { .. })
        ));

        assert_eq!(Money::from_paise(23_600).to_decimal().to_string(), "236.00");
        assert_eq!(Money::from_paise(5).to_decimal().to_string(), "0.05");
    }
}
