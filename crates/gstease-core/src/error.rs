//! # Error Types
//!
//! Domain-specific error types for gstease-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gstease-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gstease-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── StockError       - Stock ledger failures                          │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What the client sees (code + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invoice does not exist.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Deduction would take stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice line: Widget × 10
    ///      │
    ///      ▼
    /// Ledger: stock = 3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Widget", available: 3, requested: 10 }
    ///      │
    ///      ▼
    /// best_effort: warning on the invoice   strict: invoice rejected
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Manual adjustment would take stock below zero.
    #[error("Adjustment of {delta} on {product} would leave stock at {resulting}")]
    InvalidAdjustment {
        product: String,
        delta: i64,
        resulting: i64,
    },

    /// No unique invoice number could be drawn after retrying.
    #[error("Could not allocate a unique invoice number after {attempts} attempts")]
    InvoiceNumberConflict { attempts: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is written, so a rejected request never leaves
/// partial state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, too many decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A referenced record does not exist.
    #[error("{field} refers to unknown {entity} '{id}'")]
    UnknownReference {
        field: String,
        entity: String,
        id: String,
    },

    /// Collection has too many entries.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Qualifies the field name with a parent path, e.g. `quantity` on the
    /// third line becomes `items[2].quantity`.
    pub fn within(mut self, parent: &str) -> Self {
        let field = match &mut self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::UnknownReference { field, .. }
            | ValidationError::TooMany { field, .. } => field,
        };
        *field = format!("{}.{}", parent, field);
        self
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Widget".to_string(),
            available: 3,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget: available 3, requested 10"
        );

        let err = ValidationError::required("items");
        assert_eq!(err.to_string(), "items is required");
    }

    #[test]
    fn test_validation_wraps_into_core() {
        let err: CoreError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("quantity must be positive"));
    }

    #[test]
    fn test_within_qualifies_field() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .within("items[2]");
        assert_eq!(err.to_string(), "items[2].quantity must be positive");
    }
}
