//! # Pricing
//!
//! Line and document total derivation.
//!
//! ## Derivation Rules
//! ```text
//! per line:
//!   gross           = unit_price * quantity
//!   discount_amount = round(gross * discount_bps / 10_000)
//!   line_total      = gross - discount_amount
//!
//! per document:
//!   subtotal        = Σ line_total
//!   grand_total     = subtotal - document_discount
//! ```
//!
//! Totals are always derived here, never trusted from the caller: the service
//! layer recomputes them from validated lines before persisting, so a stored
//! header can never disagree with its lines.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::{DiscountRate, Money};
use crate::validation;

// =============================================================================
// Line Input
// =============================================================================

/// One validated line as submitted by the caller.
///
/// `unit_price` is explicit rather than looked up so that purchases can
/// record the supplier's price and sales can honor a price override; the
/// service layer decides which price goes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInput {
    pub item_code: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Per-line discount in basis points (0..=10_000).
    pub discount_bps: u32,
}

// =============================================================================
// Computed Amounts
// =============================================================================

/// Derived monetary amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// `unit_price * quantity`, before discount.
    pub gross: Money,
    /// Rounded discount portion of the gross.
    pub discount_amount: Money,
    /// `gross - discount_amount`.
    pub line_total: Money,
}

/// Derived monetary totals for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of all line totals.
    pub subtotal: Money,
    /// Document-level discount amount.
    pub discount: Money,
    /// `subtotal - discount`.
    pub grand_total: Money,
}

// =============================================================================
// Derivation
// =============================================================================

/// Computes the derived amounts for a single line.
///
/// Validates quantity, price, and discount range first; a line that fails
/// validation contributes nothing and aborts the whole document.
pub fn compute_line(line: &LineInput) -> CoreResult<LineAmounts> {
    validation::validate_line(line)?;

    let rate = DiscountRate::new(line.discount_bps)?;
    let gross = line.unit_price * line.quantity;
    let discount_amount = gross.discount_part(rate);

    Ok(LineAmounts {
        gross,
        discount_amount,
        line_total: gross - discount_amount,
    })
}

/// Computes per-line amounts and document totals in one pass.
///
/// Returns the amounts in line order so the caller can persist them next to
/// their inputs. The document-level `discount` is an absolute amount and is
/// clamped into `0..=subtotal` by validation.
pub fn compute_document(
    lines: &[LineInput],
    discount: Money,
) -> CoreResult<(Vec<LineAmounts>, DocumentTotals)> {
    validation::validate_lines(lines)?;
    validation::validate_document_discount(discount)?;

    let mut amounts = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();

    for line in lines {
        let computed = compute_line(line)?;
        subtotal += computed.line_total;
        amounts.push(computed);
    }

    validation::validate_discount_within_subtotal(discount, subtotal)?;

    Ok((
        amounts,
        DocumentTotals {
            subtotal,
            discount,
            grand_total: subtotal - discount,
        },
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================
