//! # GST Tax Calculator
//!
//! Turns invoice lines into per-line GST and invoice totals.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GST Calculation                                  │
//! │                                                                         │
//! │  For each line i:                                                       │
//! │    taxable_i = price_i × qty_i                                          │
//! │    gst_i     = round_half_up(taxable_i × rate_i)   ← per line, paise   │
//! │    total_i   = taxable_i + gst_i                                        │
//! │                                                                         │
//! │  subtotal  = Σ taxable_i                                                │
//! │  total_gst = Σ gst_i                                                    │
//! │                                                                         │
//! │  ┌──────────────────────────┐    ┌──────────────────────────┐          │
//! │  │ CgstSgst (intra-state)   │    │ Igst (inter-state)       │          │
//! │  │ cgst = ⌈total_gst / 2⌉   │    │ igst = total_gst         │          │
//! │  │ sgst = cgst              │    │ cgst = sgst = 0          │          │
//! │  │ igst = 0                 │    │                          │          │
//! │  └──────────────────────────┘    └──────────────────────────┘          │
//! │                                                                         │
//! │  round_off = cgst + sgst + igst - total_gst            (0 or 1 paisa)  │
//! │  total     = subtotal + total_gst + round_off                           │
//! │            = subtotal + cgst + sgst + igst                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Odd-Paisa Split
//! When `total_gst` is an odd number of paise the half is rounded up so
//! CGST and SGST stay equal. The extra paisa is carried as `round_off`, a
//! separate line on the invoice: the line totals plus `round_off` give the
//! invoice total, and so do the tax components.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{GstRate, GstType};
use crate::validation::{validate_line_count, validate_quantity};

/// One priced line going into the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
    pub price: Money,
    pub quantity: i64,
    pub gst_rate: GstRate,
}

impl LineInput {
    pub fn new(price: Money, quantity: i64, gst_rate: GstRate) -> Self {
        LineInput {
            price,
            quantity,
            gst_rate,
        }
    }
}

/// Computed amounts for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// `price × quantity`.
    pub taxable_value: Money,
    pub gst_amount: Money,
    pub total_amount: Money,
}

/// Full result of a calculation, lines in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub lines: Vec<LineAmounts>,
    pub subtotal: Money,
    pub total_gst: Money,
    pub cgst_amount: Money,
    pub sgst_amount: Money,
    pub igst_amount: Money,
    /// `cgst + sgst + igst - total_gst`. One paisa when an odd GST amount is
    /// split into equal halves, otherwise zero.
    pub round_off: Money,
    pub total_amount: Money,
}

/// Computes GST for a set of lines.
///
/// ## Errors
/// - `ValidationError::Required` if `lines` is empty
/// - `ValidationError::MustNotBeNegative` for a negative price
/// - `ValidationError::MustBePositive` / `OutOfRange` for a bad quantity
/// - `ValidationError::OutOfRange` for a rate above 100%
///
/// ## Example
/// ```rust
/// use gstease_core::money::Money;
/// use gstease_core::tax::{calculate, LineInput};
/// use gstease_core::types::{GstRate, GstType};
///
/// let lines = [LineInput::new(Money::from_paise(10_000), 2, GstRate::from_bps(1800))];
/// let igst = calculate(&lines, GstType::Igst).unwrap();
///
/// assert_eq!(igst.igst_amount.paise(), 3_600);
/// assert!(igst.cgst_amount.is_zero());
/// assert_eq!(igst.total_amount.paise(), 23_600);
/// ```
pub fn calculate(lines: &[LineInput], gst_type: GstType) -> Result<TaxBreakdown, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::required("items"));
    }
    validate_line_count(lines.len())?;

    let mut amounts = Vec::with_capacity(lines.len());
    let mut subtotal: i128 = 0;
    let mut total_gst: i128 = 0;

    for line in lines {
        let line_amounts = calculate_line(line)?;
        subtotal += line_amounts.taxable_value.paise() as i128;
        total_gst += line_amounts.gst_amount.paise() as i128;
        amounts.push(line_amounts);
    }

    let subtotal = to_money("subtotal", subtotal)?;
    let total_gst = to_money("total", total_gst)?;

    let (cgst, sgst, igst) = split(total_gst, gst_type);
    let round_off = cgst + sgst + igst - total_gst;
    let total = to_money(
        "total",
        subtotal.paise() as i128 + total_gst.paise() as i128 + round_off.paise() as i128,
    )?;

    Ok(TaxBreakdown {
        lines: amounts,
        subtotal,
        total_gst,
        cgst_amount: cgst,
        sgst_amount: sgst,
        igst_amount: igst,
        round_off,
        total_amount: total,
    })
}

/// Computes GST for one line.
pub fn calculate_line(line: &LineInput) -> Result<LineAmounts, ValidationError> {
    if line.price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    validate_quantity(line.quantity)?;
    if line.gst_rate.bps() > GstRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "gstRate".to_string(),
            min: 0,
            max: 100,
        });
    }

    let taxable = line
        .price
        .checked_mul_quantity(line.quantity)
        .ok_or_else(|| ValidationError::invalid_format("price", "line amount is too large"))?;
    let gst = taxable.apply_rate(line.gst_rate);
    let total = to_money("price", taxable.paise() as i128 + gst.paise() as i128)?;

    Ok(LineAmounts {
        taxable_value: taxable,
        gst_amount: gst,
        total_amount: total,
    })
}

/// Splits total GST into (cgst, sgst, igst).
pub fn split(total_gst: Money, gst_type: GstType) -> (Money, Money, Money) {
    match gst_type {
        GstType::CgstSgst => {
            let half = total_gst.half_up();
            (half, half, Money::zero())
        }
        GstType::Igst => (Money::zero(), Money::zero(), total_gst),
    }
}

fn to_money(field: &str, paise: i128) -> Result<Money, ValidationError> {
    i64::try_from(paise)
        .map(Money::from_paise)
        .map_err(|_| ValidationError::invalid_format(field, "amount is too large"))
}

// =============================================================================
// Unit Tests
// =============================================================================
