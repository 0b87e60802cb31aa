//! # Repository Module
//!
//! Database repository implementations for the Kasira back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  Repositories own the SQL; services own the orchestration.          │
//! │                                                                     │
//! │  Service                                                            │
//! │       │  db.items().find("ITM00001")                                │
//! │       ▼                                                             │
//! │  ItemRepository                                                     │
//! │  ├── find(&self, code)              ← reads on the pool             │
//! │  ├── insert_with(executor, item)    ← writes on a caller-owned      │
//! │  └── decrease_stock_with(...)         transaction                   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write methods are generic over `sqlx::Executor` so a service can compose
//! several repository calls into one transaction (`&mut *tx`) while tests
//! and simple callers pass the pool directly.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Item CRUD, search, and guarded stock moves
//! - [`supplier::SupplierRepository`] - Supplier CRUD
//! - [`member::MemberRepository`] - Member CRUD
//! - [`sequence::SequenceRepository`] - Atomic code sequence counters
//! - [`purchase::PurchaseRepository`] - Purchase headers and lines
//! - [`sale::SaleRepository`] - Sale headers and lines

pub mod item;
pub mod member;
pub mod purchase;
pub mod sale;
pub mod sequence;
pub mod supplier;

/// Which lifecycle states a document listing shows.
///
/// Default listings show active documents; the retired view is a separate
/// toggle rather than a mixed list, so an operator always knows which side
/// of the ledger they are looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleScope {
    #[default]
    Active,
    Retired,
    All,
}
