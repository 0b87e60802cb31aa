//! # Domain Types
//!
//! Core domain types for the Kasira back office.
//!
//! ## Dual-Key Identity Pattern
//! Transactional entities are identified by a generated business code
//! (`ITM00001`, `INV-S25010001`) that downstream systems and print templates
//! key off; surrogate UUIDs are used only where a business code would carry
//! no meaning (line rows, suppliers).
//!
//! ## Snapshot Pattern
//! Line rows copy the item's name and unit price at transaction time. Item
//! edits after the fact never rewrite history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{DiscountRate, Money};

// =============================================================================
// Document Kind
// =============================================================================

/// The two transaction document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Goods bought from a supplier; completion increases stock.
    Purchase,
    /// Goods sold to a member or walk-in customer; completion decreases stock.
    Sale,
}

impl DocumentKind {
    /// Stable key used for sequence-counter scoping.
    pub const fn counter_key(&self) -> &'static str {
        match self {
            DocumentKind::Purchase => "purchase",
            DocumentKind::Sale => "sale",
        }
    }
}

// =============================================================================
// Document Status
// =============================================================================

/// Lifecycle status of a transaction document.
///
/// Modeled as a closed enumeration with an explicit transition table
/// ([`stock_effect_on_create`], [`stock_effect_on_transition`]) so that
/// creation-time and update-time stock logic cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Recorded but not yet settled; has no stock effect.
    Pending,
    /// Settled; the only status that carries a stock effect.
    Paid,
    /// Abandoned; a previously paid document reverses its stock effect.
    Cancelled,
}

impl Default for DocumentStatus {
    fn default() -> Self {
        DocumentStatus::Pending
    }
}

/// What a status change means for item stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Apply the document's stock movement (purchase: +qty, sale: -qty).
    Apply,
    /// Reverse a previously applied movement.
    Reverse,
    /// No stock change.
    None,
}

/// Stock effect of creating a document directly in `status`.
pub const fn stock_effect_on_create(status: DocumentStatus) -> StockEffect {
    match status {
        DocumentStatus::Paid => StockEffect::Apply,
        DocumentStatus::Pending | DocumentStatus::Cancelled => StockEffect::None,
    }
}

/// Stock effect of moving a document from `from` to `to`.
///
/// Returns `None` (the Option) for transitions that are not allowed at all.
pub const fn stock_effect_on_transition(
    from: DocumentStatus,
    to: DocumentStatus,
) -> Option<StockEffect> {
    use DocumentStatus::*;
    match (from, to) {
        (Pending, Paid) => Some(StockEffect::Apply),
        (Paid, Cancelled) => Some(StockEffect::Reverse),
        (Pending, Cancelled) => Some(StockEffect::None),
        // Cancelled is terminal; paid documents cannot go back to pending.
        _ => None,
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was settled. Sales only; purchases carry no payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
}

// =============================================================================
// Lifecycle (soft retirement)
// =============================================================================

/// Soft-retirement state, derived from the nullable retirement timestamp.
///
/// Retirement is a reversible hide: rows stay addressable by historical
/// documents and reports on demand, but retired entities are excluded from
/// default listings and from new transaction lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Active,
    Retired,
}

impl Lifecycle {
    /// Derives the lifecycle state from a retirement timestamp.
    pub fn from_retired_at(retired_at: Option<DateTime<Utc>>) -> Self {
        match retired_at {
            Some(_) => Lifecycle::Retired,
            None => Lifecycle::Active,
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A stock item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Business code, `ITM` + 5 digits (e.g. `ITM00001`).
    pub code: String,

    /// Display name shown on documents and reports.
    pub name: String,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Unit sell price in minor currency units.
    pub sell_price: i64,

    /// Current stock quantity. Never negative.
    pub stock: i64,

    /// Minimum-stock threshold for the low-stock listing.
    pub min_stock: i64,

    /// Soft-retirement timestamp; `None` while active.
    pub retired_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the sell price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.sell_price)
    }

    /// Current lifecycle state.
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_retired_at(self.retired_at)
    }

    /// Whether the item may appear on new transaction lines.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.retired_at.is_none()
    }

    /// Whether stock is at or below the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Reference Entities
// =============================================================================

/// A supplier of purchased goods. Descriptive only; no derived invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    /// Surrogate id (UUID v4).
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered member (customer with an account).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Member {
    /// Business code, `MBR` + 5 digits.
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Purchase Document
// =============================================================================

/// A purchase transaction header.
///
/// Invariants: `grand_total = subtotal - discount` and
/// `subtotal = Σ(line.line_total)` over its owned lines. Created together
/// with its lines in one atomic unit, never partially persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseDocument {
    /// Business code, `INV-P` + YYMM + 4 digits.
    pub code: String,

    /// Supplier reference.
    pub supplier_id: String,

    /// Business date of the transaction (user-supplied, may be backdated).
    pub txn_date: NaiveDate,

    pub subtotal: i64,
    pub discount: i64,
    pub grand_total: i64,

    pub status: DocumentStatus,

    /// Username of the operator who recorded the document.
    pub created_by: String,

    pub retired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseDocument {
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_retired_at(self.retired_at)
    }
}

/// One item entry on a purchase document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseLine {
    /// Surrogate id (UUID v4).
    pub id: String,
    pub purchase_code: String,
    pub item_code: String,

    /// Item name at transaction time (frozen).
    pub item_name: String,

    /// Quantity purchased. Always >= 1.
    pub quantity: i64,

    /// Unit price at transaction time (frozen, minor units).
    pub unit_price: i64,

    /// Per-line discount in basis points (0..=10_000).
    pub discount_bps: i64,

    /// Computed discount amount in minor units.
    pub discount_amount: i64,

    /// Computed line total: `quantity * unit_price - discount_amount`.
    pub line_total: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Document
// =============================================================================

/// A sale transaction header.
///
/// The counterparty is either a registered member (by code) or a free-text
/// customer name for walk-ins; when both are present the member name takes
/// precedence for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDocument {
    /// Business code, `INV-S` + YYMM + 4 digits.
    pub code: String,

    pub member_code: Option<String>,
    pub customer_name: Option<String>,

    pub txn_date: NaiveDate,

    pub subtotal: i64,
    pub discount: i64,
    pub grand_total: i64,

    pub payment_method: PaymentMethod,
    pub status: DocumentStatus,

    pub created_by: String,

    pub retired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleDocument {
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_retired_at(self.retired_at)
    }
}

/// One item entry on a sale document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    /// Surrogate id (UUID v4).
    pub id: String,
    pub sale_code: String,
    pub item_code: String,

    /// Item name at transaction time (frozen).
    pub item_name: String,

    pub quantity: i64,
    pub unit_price: i64,
    pub discount_bps: i64,
    pub discount_amount: i64,
    pub line_total: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.unit_price)
    }

    /// Returns the per-line discount rate.
    #[inline]
    pub fn discount_rate(&self) -> DiscountRate {
        DiscountRate::from_percent_hundredths(self.discount_bps as u32)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default() {
        assert_eq!(DocumentStatus::default(), DocumentStatus::Pending);
    }

    #[test]
    fn test_stock_effect_on_create() {
        assert_eq!(
            stock_effect_on_create(DocumentStatus::Paid),
            StockEffect::Apply
        );
        assert_eq!(
            stock_effect_on_create(DocumentStatus::Pending),
            StockEffect::None
        );
        assert_eq!(
            stock_effect_on_create(DocumentStatus::Cancelled),
            StockEffect::None
        );
    }

    #[test]
    fn test_transition_table() {
        use DocumentStatus::*;

        assert_eq!(
            stock_effect_on_transition(Pending, Paid),
            Some(StockEffect::Apply)
        );
        assert_eq!(
            stock_effect_on_transition(Paid, Cancelled),
            Some(StockEffect::Reverse)
        );
        assert_eq!(
            stock_effect_on_transition(Pending, Cancelled),
            Some(StockEffect::None)
        );

        // Disallowed transitions
        assert_eq!(stock_effect_on_transition(Paid, Pending), None);
        assert_eq!(stock_effect_on_transition(Cancelled, Paid), None);
        assert_eq!(stock_effect_on_transition(Cancelled, Pending), None);
    }

    #[test]
    fn test_lifecycle_from_retired_at() {
        assert_eq!(Lifecycle::from_retired_at(None), Lifecycle::Active);
        assert_eq!(
            Lifecycle::from_retired_at(Some(Utc::now())),
            Lifecycle::Retired
        );
    }

    #[test]
    fn test_item_low_stock() {
        let now = Utc::now();
        let item = Item {
            code: "ITM00001".to_string(),
            name: "Rice 5kg".to_string(),
            description: None,
            sell_price: 65_000,
            stock: 3,
            min_stock: 5,
            retired_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(item.is_low_stock());
        assert!(item.is_active());
    }
}
