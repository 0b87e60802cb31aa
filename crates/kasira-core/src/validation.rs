//! # Validation
//!
//! Input validation for everything that enters the system.
//!
//! All checks run before any persistence or stock mutation begins, and a
//! failing line aborts the whole document. The functions here are pure;
//! checks that need the database (does the item exist, is it retired, is
//! there enough stock) live in the service layer.

use crate::error::ValidationError;
use crate::money::{DiscountRate, Money};
use crate::pricing::LineInput;
use crate::{MAX_DOCUMENT_LINES, MAX_LINE_QUANTITY};

/// Maximum length for names (items, members, suppliers, customers).
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length for free-text fields (description, address, contact).
pub const MAX_TEXT_LEN: usize = 500;

type Result<T> = std::result::Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required, bounded name field. Returns the trimmed value.
pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates an optional free-text field. Empty input becomes `None`.
pub fn validate_text(field: &str, value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            if trimmed.len() > MAX_TEXT_LEN {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: MAX_TEXT_LEN,
                });
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Validates a non-negative price in minor units.
pub fn validate_price(field: &str, price: Money) -> Result<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative stock threshold.
pub fn validate_min_stock(min_stock: i64) -> Result<()> {
    if min_stock < 0 {
        return Err(ValidationError::MustBePositive {
            field: "min_stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Line Validators
// =============================================================================

/// Validates a single transaction line.
pub fn validate_line(line: &LineInput) -> Result<()> {
    if line.item_code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }
    if line.quantity < 1 || line.quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    validate_price("unit_price", line.unit_price)?;
    DiscountRate::new(line.discount_bps)?;
    Ok(())
}

/// Validates the line collection of a document as a whole.
pub fn validate_lines(lines: &[LineInput]) -> std::result::Result<(), crate::CoreError> {
    if lines.is_empty() {
        return Err(crate::CoreError::EmptyDocument);
    }
    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_DOCUMENT_LINES as i64,
        }
        .into());
    }
    Ok(())
}

/// Validates a document-level discount amount.
pub fn validate_document_discount(discount: Money) -> Result<()> {
    if discount.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "discount".to_string(),
        });
    }
    Ok(())
}

/// Rejects a document discount larger than what the lines add up to.
pub fn validate_discount_within_subtotal(discount: Money, subtotal: Money) -> Result<()> {
    if discount > subtotal {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal.minor(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
