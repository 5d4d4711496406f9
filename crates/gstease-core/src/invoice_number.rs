//! # Invoice Numbering
//!
//! Formats and parses the human-facing invoice number `INV-NNNNNN`.
//!
//! ```text
//! count of issued invoices ──► next(count) ──► "INV-" + (count + 1) padded to 6
//!
//!     0  → INV-000001
//!    41  → INV-000042
//! 999999 → INV-1000000   (grows past six digits, never wraps)
//! ```
//!
//! This module only does the formatting. Drawing a value that is unique
//! across concurrent requests is the job of the counter row in gstease-db.

/// Prefix on every invoice number.
pub const PREFIX: &str = "INV-";

/// Minimum number of digits after the prefix.
pub const WIDTH: usize = 6;

/// Returns the number that follows `current_count` issued invoices.
///
/// ## Example
/// ```rust
/// use gstease_core::invoice_number;
///
/// assert_eq!(invoice_number::next(0), "INV-000001");
/// assert_eq!(invoice_number::next(41), "INV-000042");
/// ```
pub fn next(current_count: u64) -> String {
    format(current_count.saturating_add(1))
}

/// Formats a sequence value.
pub fn format(sequence: u64) -> String {
    format!("{}{:0width$}", PREFIX, sequence, width = WIDTH)
}

/// Extracts the sequence value from a well-formed invoice number.
///
/// ```rust
/// use gstease_core::invoice_number;
///
/// assert_eq!(invoice_number::parse("INV-000042"), Some(42));
/// assert_eq!(invoice_number::parse("42"), None);
/// ```
pub fn parse(number: &str) -> Option<u64> {
    let digits = number.strip_prefix(PREFIX)?;
    if digits.len() < WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_pads_to_six_digits() {
        assert_eq!(next(0), "INV-000001");
        assert_eq!(next(9), "INV-000010");
        assert_eq!(next(123_455), "INV-123456");
    }

    #[test]
    fn test_next_grows_past_width() {
        assert_eq!(next(999_999), "INV-1000000");
        assert_eq!(parse("INV-1000000"), Some(1_000_000));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse("INV-12"), None);
        assert_eq!(parse("INV-00004a"), None);
        assert_eq!(parse("BILL-000001"), None);
        assert_eq!(parse(&next(41)), Some(42));
    }
}
