//! # kasira-core: Pure Business Logic for the Kasira Back Office
//!
//! This crate is the heart of the system. It contains the rules that must be
//! correct regardless of how documents are displayed or exported: money
//! arithmetic, document-code formats, per-line and per-document total
//! derivation, the status transition table that decides when stock moves,
//! and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Kasira Architecture                           │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐ │
//! │  │            ★ kasira-core (THIS CRATE) ★                   │ │
//! │  │                                                           │ │
//! │  │  ┌────────┐ ┌────────┐ ┌─────────┐ ┌────────────────┐   │ │
//! │  │  │ types  │ │ money  │ │  codes  │ │ pricing        │   │ │
//! │  │  │ Item   │ │ Money  │ │ INV-S.. │ │ line totals    │   │ │
//! │  │  │ Sale   │ │ bps    │ │ ITM..   │ │ doc totals     │   │ │
//! │  │  └────────┘ └────────┘ └─────────┘ └────────────────┘   │ │
//! │  │                                                           │ │
//! │  │  NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS        │ │
//! │  └───────────────────────────────────────────────────────────┘ │
//! │                              │                                  │
//! │  ┌───────────────────────────▼───────────────────────────────┐ │
//! │  │               kasira-db (Database Layer)                  │ │
//! │  │      SQLite repositories, services, report queries        │ │
//! │  └───────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, documents, lines, status enums)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`codes`] - Document code formats and sequence scopes
//! - [`pricing`] - Line and document total derivation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, and clock access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in minor units (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codes;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use codes::SequenceScope;
pub use error::{CoreError, ValidationError};
pub use money::{DiscountRate, Money};
pub use pricing::{DocumentTotals, LineAmounts, LineInput};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single item on one line.
///
/// Prevents accidental over-ordering (e.g. typing 10000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// Maximum number of lines in a single document.
pub const MAX_DOCUMENT_LINES: usize = 200;
