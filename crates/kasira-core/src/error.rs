//! # Error Types
//!
//! Domain-specific error types for kasira-core.
//!
//! ## Error Hierarchy
//! ```text
//! kasira-core errors (this file)
//! ├── CoreError        - business rule violations
//! └── ValidationError  - input validation failures
//!
//! kasira-db errors (separate crate)
//! ├── DbError          - database operation failures
//! └── ServiceError     - what service callers see
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item code, document code, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. They abort the whole operation
/// on the write path and must surface a specific, user-actionable message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Item exists but has been retired and may not appear on new documents.
    #[error("Item {0} is retired and cannot be sold or purchased")]
    ItemRetired(String),

    /// A sale line's quantity exceeds the item's current stock.
    ///
    /// The entire document creation fails; stock is left unchanged.
    #[error("Insufficient stock for {item_code}: available {available}, requested {requested}")]
    InsufficientStock {
        item_code: String,
        available: i64,
        requested: i64,
    },

    /// Document (purchase or sale header) not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The numeric suffix of a code scope has been exhausted.
    ///
    /// E.g. more than 9999 sales in one calendar month.
    #[error("Sequence exhausted for prefix {prefix}: maximum {max} codes")]
    SequenceExhausted { prefix: String, max: i64 },

    /// A document must carry at least one line.
    #[error("Document must contain at least one line")]
    EmptyDocument,

    /// The requested status change is not in the transition table.
    #[error("Cannot change document status from {from:?} to {to:?}")]
    InvalidStatusTransition { from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet requirements, and are raised before
/// any persistence or stock mutation begins.
#[derive(Debug, Error)]
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

    /// Invalid format (e.g. malformed code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_code: "ITM00007".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for ITM00007: available 2, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
