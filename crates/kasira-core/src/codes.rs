//! # Document Codes
//!
//! Code formats and sequence scopes for every generated business code.
//!
//! ## Code Formats
//! ```text
//! ┌───────────┬──────────────────────┬──────────────────┐
//! │ Entity    │ Format               │ Example          │
//! ├───────────┼──────────────────────┼──────────────────┤
//! │ Item      │ ITM + 5 digits       │ ITM00042         │
//! │ Member    │ MBR + 5 digits       │ MBR00007         │
//! │ Purchase  │ INV-P + YYMM + 4 dig │ INV-P25010003    │
//! │ Sale      │ INV-S + YYMM + 4 dig │ INV-S25010001    │
//! └───────────┴──────────────────────┴──────────────────┘
//! ```
//!
//! A [`SequenceScope`] names one independent counter: item and member codes
//! share a single global counter each, while document codes restart at 0001
//! every calendar month. The month is derived from the document's business
//! date, never from a wall clock, so backdated entries land in the period
//! they belong to.
//!
//! The scope only describes and formats; claiming the next sequence value is
//! the database layer's job (a single atomic upsert), so two concurrent
//! callers can never observe the same value.

use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};
use crate::types::DocumentKind;

// =============================================================================
// Sequence Scope
// =============================================================================

/// One independent code counter and its formatting rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceScope {
    /// Counter family key, e.g. `"sale"` or `"item"`.
    pub counter_kind: &'static str,

    /// Period discriminator within the family. Date-scoped counters use
    /// `YYMM`; global counters use the empty string.
    pub period: String,

    /// Literal prefix of the emitted code.
    pub prefix: String,

    /// Number of zero-padded digits after the prefix.
    pub width: u32,
}

impl SequenceScope {
    /// Scope for item codes: `ITM#####`, one global counter.
    pub fn item() -> Self {
        SequenceScope {
            counter_kind: "item",
            period: String::new(),
            prefix: "ITM".to_string(),
            width: 5,
        }
    }

    /// Scope for member codes: `MBR#####`, one global counter.
    pub fn member() -> Self {
        SequenceScope {
            counter_kind: "member",
            period: String::new(),
            prefix: "MBR".to_string(),
            width: 5,
        }
    }

    /// Scope for purchase codes in the month of `date`: `INV-Pyymm####`.
    pub fn purchase(date: NaiveDate) -> Self {
        Self::document(DocumentKind::Purchase, date)
    }

    /// Scope for sale codes in the month of `date`: `INV-Syymm####`.
    pub fn sale(date: NaiveDate) -> Self {
        Self::document(DocumentKind::Sale, date)
    }

    /// Scope for either document kind in the month of `date`.
    pub fn document(kind: DocumentKind, date: NaiveDate) -> Self {
        let period = year_month(date);
        let tag = match kind {
            DocumentKind::Purchase => 'P',
            DocumentKind::Sale => 'S',
        };
        SequenceScope {
            counter_kind: kind.counter_key(),
            prefix: format!("INV-{tag}{period}"),
            period,
            width: 4,
        }
    }

    /// The largest sequence value this scope can express.
    pub fn max_sequence(&self) -> i64 {
        10_i64.pow(self.width) - 1
    }

    /// Formats a claimed sequence value into the final code.
    ///
    /// Fails with [`CoreError::SequenceExhausted`] when the value no longer
    /// fits the fixed width; widening the suffix would break the collision
    /// guarantee for existing codes.
    pub fn format(&self, sequence: i64) -> CoreResult<String> {
        let max = self.max_sequence();
        if sequence < 1 || sequence > max {
            return Err(CoreError::SequenceExhausted {
                prefix: self.prefix.clone(),
                max,
            });
        }
        Ok(format!(
            "{}{:0width$}",
            self.prefix,
            sequence,
            width = self.width as usize
        ))
    }
}

/// `YYMM` period key for a business date (`2025-01-15` → `"2501"`).
fn year_month(date: NaiveDate) -> String {
    format!("{:02}{:02}", date.year() % 100, date.month())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_item_code_format() {
        let scope = SequenceScope::item();
        assert_eq!(scope.format(1).unwrap(), "ITM00001");
        assert_eq!(scope.format(42).unwrap(), "ITM00042");
        assert_eq!(scope.format(99_999).unwrap(), "ITM99999");
    }

    #[test]
    fn test_member_code_format() {
        let scope = SequenceScope::member();
        assert_eq!(scope.format(7).unwrap(), "MBR00007");
    }

    #[test]
    fn test_sale_code_format() {
        let scope = SequenceScope::sale(date(2025, 1, 15));
        assert_eq!(scope.period, "2501");
        assert_eq!(scope.format(1).unwrap(), "INV-S25010001");
        assert_eq!(scope.format(9_999).unwrap(), "INV-S25019999");
    }

    #[test]
    fn test_purchase_code_format() {
        let scope = SequenceScope::purchase(date(2025, 12, 3));
        assert_eq!(scope.format(12).unwrap(), "INV-P25120012");
    }

    #[test]
    fn test_month_scoped_counters_are_independent() {
        let jan = SequenceScope::sale(date(2025, 1, 31));
        let feb = SequenceScope::sale(date(2025, 2, 1));
        assert_ne!(jan.period, feb.period);
        assert_ne!(jan.format(1).unwrap(), feb.format(1).unwrap());
    }

    #[test]
    fn test_exhaustion() {
        let scope = SequenceScope::sale(date(2025, 1, 1));
        assert_eq!(scope.max_sequence(), 9_999);

        let err = scope.format(10_000).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SequenceExhausted { max: 9_999, .. }
        ));
    }

    #[test]
    fn test_rejects_non_positive_sequence() {
        let scope = SequenceScope::item();
        assert!(scope.format(0).is_err());
        assert!(scope.format(-3).is_err());
    }

    #[test]
    fn test_century_wrap_uses_two_digit_year() {
        let scope = SequenceScope::sale(date(2031, 11, 30));
        assert_eq!(scope.format(1).unwrap(), "INV-S31110001");
    }
}
