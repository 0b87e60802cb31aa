//! # Service Module
//!
//! Transaction orchestration on top of the repositories.
//!
//! ## Service Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Where the Invariants Live                        │
//! │                                                                     │
//! │  Caller                                                             │
//! │     │  db.sale_service().create(input)                              │
//! │     ▼                                                               │
//! │  SaleService::create                                                │
//! │  ├── 1. validate lines, derive totals (kasira-core, pure)           │
//! │  ├── 2. BEGIN                                                       │
//! │  ├── 3. resolve counterparty + item snapshots                       │
//! │  ├── 4. claim sequence value, format document code                  │
//! │  ├── 5. insert header + lines                                       │
//! │  ├── 6. apply stock effect (paid documents only)                    │
//! │  └── 7. COMMIT  (any failure above rolls everything back)           │
//! │     │                                                               │
//! │     ▼                                                               │
//! │  Repositories (SQL only, no rules)                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Services
//!
//! - [`catalog::CatalogService`] - Items, members, and suppliers
//! - [`purchase::PurchaseService`] - Purchase documents
//! - [`sale::SaleService`] - Sale documents
//! - [`report::ReportService`] - Aggregation queries

use kasira_core::error::{CoreError, ValidationError};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;

use crate::error::DbError;

pub mod catalog;
pub mod purchase;
pub mod report;
pub mod sale;

// =============================================================================
// Service Error
// =============================================================================

/// Errors surfaced by the service layer.
///
/// Merges business-rule violations from kasira-core with categorized
/// database failures, so callers match on one type.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation (validation, insufficient stock, bad
    /// status transition, exhausted sequence).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A generated code collided with an existing row.
    ///
    /// Transient: the caller may retry, which claims a fresh sequence
    /// value.
    #[error("Duplicate document code: {code}")]
    DuplicateCode { code: String },

    /// The row cannot be deleted while other records reference it.
    #[error("{entity} {key} still has dependent records")]
    HasDependents { entity: String, key: String },

    /// Database failure (not found, connection, query).
    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::DuplicateCode { .. } => true,
            ServiceError::Db(db) => db.is_retryable(),
            _ => false,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Opens a write transaction that takes the SQLite write lock up front.
///
/// The service write paths read (counterparty and item lookups) before
/// their first write. A deferred transaction that tries to upgrade its
/// read lock under contention fails immediately with SQLITE_BUSY instead
/// of waiting, so concurrent writers must queue on the busy timeout from
/// the start.
pub(crate) async fn begin_immediate(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, DbError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
