//! # kasira-db: Database Layer for the Kasira Back Office
//!
//! This crate provides persistence for the Kasira system: SQLite storage
//! via sqlx, repositories for row access, and services that compose
//! repositories into the transactional operations the business rules in
//! kasira-core demand.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Kasira Data Flow                             │
//! │                                                                     │
//! │  Caller (CLI, API, seed binary)                                     │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                    kasira-db (THIS CRATE)                     │  │
//! │  │                                                               │  │
//! │  │   ┌────────────┐   ┌────────────────┐   ┌─────────────────┐  │  │
//! │  │   │  Services  │──►│  Repositories  │   │   Migrations    │  │  │
//! │  │   │ sale       │   │ item, member   │   │   (embedded)    │  │  │
//! │  │   │ purchase   │   │ supplier, seq  │   │ 001_initial..   │  │  │
//! │  │   │ catalog    │   │ purchase, sale │   │ 002_indexes..   │  │  │
//! │  │   │ report     │   └────────┬───────┘   └─────────────────┘  │  │
//! │  │   └────────────┘            │                                │  │
//! │  │                    ┌────────▼───────┐                        │  │
//! │  │   uses rules from  │   SqlitePool   │                        │  │
//! │  │   kasira-core      │   (pool.rs)    │                        │  │
//! │  │                    └────────────────┘                        │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (WAL mode)                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Row-level access (SQL lives here)
//! - [`service`] - Transactional orchestration (invariants live here)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasira_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kasira.db")).await?;
//!
//! let sale = db.sale_service().create(input).await?;
//! let report = db.reports().summarize(&Default::default()).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::item::{ItemFilter, ItemRepository};
pub use repository::member::MemberRepository;
pub use repository::LifecycleScope;
pub use repository::purchase::{PurchaseFilter, PurchaseRepository};
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::sequence::SequenceRepository;
pub use repository::supplier::SupplierRepository;
