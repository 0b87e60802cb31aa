//! # Purchase Service
//!
//! Purchase document orchestration: validation, code generation, atomic
//! header+lines persistence, and the stock effects of status changes.
//!
//! ## Stock Effect Rules
//! ```text
//! create as pending    → no stock change
//! create as paid       → stock += qty per line
//! pending  → paid      → stock += qty per line
//! paid     → cancelled → stock -= qty per line (guarded; may fail if
//!                        the goods were already sold on)
//! pending  → cancelled → no stock change
//! ```
//!
//! Everything in one operation happens inside a single transaction; an
//! error at any step leaves no trace, including the claimed sequence value.

use chrono::{NaiveDate, Utc};
use kasira_core::codes::SequenceScope;
use kasira_core::error::CoreError;
use kasira_core::money::Money;
use kasira_core::pricing::{self, LineInput};
use kasira_core::types::{
    stock_effect_on_create, stock_effect_on_transition, DocumentStatus, PurchaseDocument,
    PurchaseLine, StockEffect,
};
use sqlx::{SqlitePool, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::item::ItemRepository;
use crate::repository::purchase::{PurchaseFilter, PurchaseRepository};
use crate::repository::sequence::SequenceRepository;
use crate::repository::supplier::SupplierRepository;
use crate::service::{begin_immediate, ServiceError, ServiceResult};

// =============================================================================
// Input
// =============================================================================

/// Input for creating a purchase document.
#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub supplier_id: String,
    /// Business date; also selects the code's YYMM period.
    pub txn_date: NaiveDate,
    pub lines: Vec<LineInput>,
    /// Document-level discount amount in minor units.
    pub discount: Money,
    pub status: DocumentStatus,
    pub created_by: String,
}

// =============================================================================
// Purchase Service
// =============================================================================

/// Service for purchase document operations.
#[derive(Debug, Clone)]
pub struct PurchaseService {
    pool: SqlitePool,
}

impl PurchaseService {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseService { pool }
    }

    /// Creates a purchase document with its lines in one transaction.
    ///
    /// Paid documents immediately increase stock for every line; pending
    /// documents record intent only.
    pub async fn create(&self, input: CreatePurchase) -> ServiceResult<PurchaseDocument> {
        // Pure validation and total derivation first; nothing touches the
        // database until the input is known-good.
        let (amounts, totals) = pricing::compute_document(&input.lines, input.discount)?;

        let mut tx = begin_immediate(&self.pool).await?;

        SupplierRepository::find_with(&mut *tx, &input.supplier_id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", &input.supplier_id))?;

        // Resolve item snapshots; retired items may not appear on new lines.
        let mut snapshots = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let item = ItemRepository::find_with(&mut *tx, &line.item_code)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound(line.item_code.clone()))?;
            if !item.is_active() {
                return Err(CoreError::ItemRetired(item.code).into());
            }
            snapshots.push(item);
        }

        let scope = SequenceScope::purchase(input.txn_date);
        let seq = SequenceRepository::claim_with(&mut *tx, &scope).await?;
        let code = scope.format(seq)?;

        let now = Utc::now();
        let doc = PurchaseDocument {
            code: code.clone(),
            supplier_id: input.supplier_id.clone(),
            txn_date: input.txn_date,
            subtotal: totals.subtotal.minor(),
            discount: totals.discount.minor(),
            grand_total: totals.grand_total.minor(),
            status: input.status,
            created_by: input.created_by.clone(),
            retired_at: None,
            created_at: now,
            updated_at: now,
        };

        PurchaseRepository::insert_header_with(&mut *tx, &doc)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => ServiceError::DuplicateCode { code: code.clone() },
                other => other.into(),
            })?;

        for ((line, amount), item) in input.lines.iter().zip(&amounts).zip(&snapshots) {
            let row = PurchaseLine {
                id: Uuid::new_v4().to_string(),
                purchase_code: code.clone(),
                item_code: line.item_code.clone(),
                item_name: item.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.minor(),
                discount_bps: line.discount_bps as i64,
                discount_amount: amount.discount_amount.minor(),
                line_total: amount.line_total.minor(),
                created_at: now,
            };
            PurchaseRepository::insert_line_with(&mut *tx, &row).await?;
        }

        if stock_effect_on_create(input.status) == StockEffect::Apply {
            for line in &input.lines {
                ItemRepository::increase_stock_with(&mut *tx, &line.item_code, line.quantity, now)
                    .await?;
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            code = %doc.code,
            supplier = %doc.supplier_id,
            grand_total = doc.grand_total,
            status = ?doc.status,
            "Purchase created"
        );
        Ok(doc)
    }

    /// Fetches a document with its lines.
    pub async fn get(&self, code: &str) -> ServiceResult<(PurchaseDocument, Vec<PurchaseLine>)> {
        let repo = PurchaseRepository::new(self.pool.clone());
        let doc = repo.get(code).await?;
        let lines = repo.lines(code).await?;
        Ok((doc, lines))
    }

    /// Lists documents matching the filter, newest first.
    pub async fn list(&self, filter: &PurchaseFilter) -> ServiceResult<Vec<PurchaseDocument>> {
        Ok(PurchaseRepository::new(self.pool.clone()).list(filter).await?)
    }

    /// Moves a document to a new status, applying the stock effect of the
    /// transition from the table in kasira-core.
    pub async fn set_status(
        &self,
        code: &str,
        new_status: DocumentStatus,
    ) -> ServiceResult<PurchaseDocument> {
        let mut tx = begin_immediate(&self.pool).await?;

        let doc = PurchaseRepository::find_with(&mut *tx, code)
            .await?
            .ok_or_else(|| CoreError::DocumentNotFound(code.to_string()))?;

        let effect = stock_effect_on_transition(doc.status, new_status).ok_or_else(|| {
            CoreError::InvalidStatusTransition {
                from: format!("{:?}", doc.status),
                to: format!("{:?}", new_status),
            }
        })?;

        let now = Utc::now();
        match effect {
            StockEffect::Apply => {
                let lines = PurchaseRepository::lines_with(&mut *tx, code).await?;
                for line in &lines {
                    ItemRepository::increase_stock_with(&mut *tx, &line.item_code, line.quantity, now)
                        .await?;
                }
            }
            StockEffect::Reverse => {
                // Taking back purchased goods can fail when some were
                // already sold on.
                reverse_purchase_stock(&mut tx, code, now).await?;
            }
            StockEffect::None => {}
        }

        PurchaseRepository::update_status_with(&mut *tx, code, new_status, now).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(code, from = ?doc.status, to = ?new_status, "Purchase status changed");

        Ok(PurchaseRepository::new(self.pool.clone()).get(code).await?)
    }

    /// Retires a document: hidden from default listings, stock untouched.
    ///
    /// Retirement is bookkeeping, not reversal; cancel the document first
    /// if its stock effect must be undone.
    pub async fn retire(&self, code: &str) -> ServiceResult<()> {
        let now = Utc::now();
        let updated = PurchaseRepository::set_retired_with(&self.pool, code, Some(now), now).await?;
        if !updated {
            return Err(CoreError::DocumentNotFound(code.to_string()).into());
        }
        info!(code, "Purchase retired");
        Ok(())
    }

    /// Restores a retired document.
    pub async fn restore(&self, code: &str) -> ServiceResult<()> {
        let updated = PurchaseRepository::set_retired_with(&self.pool, code, None, Utc::now()).await?;
        if !updated {
            return Err(CoreError::DocumentNotFound(code.to_string()).into());
        }
        info!(code, "Purchase restored");
        Ok(())
    }

    /// Permanently deletes a document and its lines.
    ///
    /// Paid documents are refused: their stock effect is live and must be
    /// cancelled first so the movement stays accounted for.
    pub async fn hard_delete(&self, code: &str) -> ServiceResult<()> {
        let mut tx = begin_immediate(&self.pool).await?;

        let doc = PurchaseRepository::find_with(&mut *tx, code)
            .await?
            .ok_or_else(|| CoreError::DocumentNotFound(code.to_string()))?;

        if doc.status == DocumentStatus::Paid {
            return Err(CoreError::InvalidStatusTransition {
                from: "Paid".to_string(),
                to: "Deleted".to_string(),
            }
            .into());
        }

        PurchaseRepository::delete_lines_with(&mut *tx, code).await?;
        PurchaseRepository::delete_header_with(&mut *tx, code).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(code, "Purchase deleted");
        Ok(())
    }
}

/// Decreases stock for every line of a paid purchase being cancelled.
async fn reverse_purchase_stock(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    code: &str,
    now: chrono::DateTime<Utc>,
) -> ServiceResult<()> {
    let lines = PurchaseRepository::lines_with(&mut **tx, code).await?;
    for line in &lines {
        let applied =
            ItemRepository::decrease_stock_with(&mut **tx, &line.item_code, line.quantity, now)
                .await?;
        if !applied {
            let available = ItemRepository::find_with(&mut **tx, &line.item_code)
                .await?
                .map(|i| i.stock)
                .unwrap_or(0);
            return Err(CoreError::InsufficientStock {
                item_code: line.item_code.clone(),
                available,
                requested: line.quantity,
            }
            .into());
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::catalog::{NewItem, NewSupplier};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(db: &Database, stock: i64) -> String {
        let item = db
            .catalog()
            .create_item(NewItem {
                name: "Rice 5kg".to_string(),
                description: None,
                sell_price: Money::from_minor(65_000),
                opening_stock: stock,
                min_stock: 5,
            })
            .await
            .unwrap();
        item.code
    }

    async fn seed_supplier(db: &Database) -> String {
        db.catalog()
            .create_supplier(NewSupplier {
                name: "Toko Grosir".to_string(),
                contact: None,
                address: None,
            })
            .await
            .unwrap()
            .id
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn one_line(item_code: &str, qty: i64, price: i64) -> Vec<LineInput> {
        vec![LineInput {
            item_code: item_code.to_string(),
            quantity: qty,
            unit_price: Money::from_minor(price),
            discount_bps: 0,
        }]
    }

    #[tokio::test]
    async fn test_paid_purchase_increases_stock() {
        let db = test_db().await;
        let item = seed_item(&db, 10).await;
        let supplier = seed_supplier(&db).await;

        let doc = db
            .purchase_service()
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 50, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(doc.code, "INV-P25010001");
        assert_eq!(doc.grand_total, 2_500_000);
        assert_eq!(db.items().get(&item).await.unwrap().stock, 60);
    }

    #[tokio::test]
    async fn test_pending_purchase_leaves_stock_alone() {
        let db = test_db().await;
        let item = seed_item(&db, 10).await;
        let supplier = seed_supplier(&db).await;

        db.purchase_service()
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 50, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Pending,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(db.items().get(&item).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_pending_to_paid_applies_stock() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        let doc = service
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 20, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Pending,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        let paid = service.set_status(&doc.code, DocumentStatus::Paid).await.unwrap();
        assert_eq!(paid.status, DocumentStatus::Paid);
        assert_eq!(db.items().get(&item).await.unwrap().stock, 20);
    }

    #[tokio::test]
    async fn test_cancel_paid_purchase_reverses_stock() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        let doc = service
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 20, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(db.items().get(&item).await.unwrap().stock, 20);

        service
            .set_status(&doc.code, DocumentStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(db.items().get(&item).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_cancelled_is_terminal() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        let doc = service
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 5, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Pending,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        service
            .set_status(&doc.code, DocumentStatus::Cancelled)
            .await
            .unwrap();
        let err = service
            .set_status(&doc.code, DocumentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_supplier_rejected() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;

        let err = db
            .purchase_service()
            .create(CreatePurchase {
                supplier_id: "no-such-supplier".to_string(),
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 5, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_create_claims_nothing() {
        let db = test_db().await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        // Unknown item aborts the transaction after the sequence claim
        let err = service
            .create(CreatePurchase {
                supplier_id: supplier.clone(),
                txn_date: date(2025, 1, 15),
                lines: one_line("ITM99999", 5, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ItemNotFound(_))));

        // The rollback released the claimed value: next code is still 0001
        let item = seed_item(&db, 0).await;
        let doc = service
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 5, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(doc.code, "INV-P25010001");
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        for (day, qty) in [(10, 1), (12, 2), (11, 3)] {
            service
                .create(CreatePurchase {
                    supplier_id: supplier.clone(),
                    txn_date: date(2025, 1, day),
                    lines: one_line(&item, qty, 50_000),
                    discount: Money::zero(),
                    status: DocumentStatus::Paid,
                    created_by: "admin".to_string(),
                })
                .await
                .unwrap();
        }

        let docs = service.list(&PurchaseFilter::default()).await.unwrap();
        let days: Vec<u32> = docs
            .iter()
            .map(|d| chrono::Datelike::day(&d.txn_date))
            .collect();
        assert_eq!(days, vec![12, 11, 10]);
    }

    #[tokio::test]
    async fn test_hard_delete_refuses_paid() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        let doc = service
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 5, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        assert!(service.hard_delete(&doc.code).await.is_err());

        // Cancelling first settles the stock effect; deletion then succeeds
        service
            .set_status(&doc.code, DocumentStatus::Cancelled)
            .await
            .unwrap();
        service.hard_delete(&doc.code).await.unwrap();
        assert!(service.get(&doc.code).await.is_err());
    }

    #[tokio::test]
    async fn test_search_matches_supplier_name() {
        let db = test_db().await;
        let item = seed_item(&db, 0).await;
        let supplier = seed_supplier(&db).await;
        let service = db.purchase_service();

        service
            .create(CreatePurchase {
                supplier_id: supplier,
                txn_date: date(2025, 1, 15),
                lines: one_line(&item, 5, 50_000),
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        let search = |s: &str| PurchaseFilter {
            search: Some(s.to_string()),
            ..Default::default()
        };

        assert_eq!(service.list(&search("Grosir")).await.unwrap().len(), 1);
        assert_eq!(service.list(&search("INV-P2501")).await.unwrap().len(), 1);
        assert!(service.list(&search("Pabrik")).await.unwrap().is_empty());
    }
}
