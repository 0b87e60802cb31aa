//! # Sale Service
//!
//! Sale document orchestration. The mirror image of `service::purchase`:
//! paid sales decrease stock through the guarded update, so a sale can
//! never drive stock negative, and cancelling a paid sale puts the goods
//! back.
//!
//! ## Counterparty
//! A sale references a registered member by code, carries a free-text
//! customer name for walk-ins, or neither (anonymous counter sale).

use chrono::{NaiveDate, Utc};
use kasira_core::codes::SequenceScope;
use kasira_core::error::CoreError;
use kasira_core::money::Money;
use kasira_core::pricing::{self, LineInput};
use kasira_core::types::{
    stock_effect_on_create, stock_effect_on_transition, DocumentStatus, PaymentMethod,
    SaleDocument, SaleLine, StockEffect,
};
use sqlx::{SqlitePool, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::item::ItemRepository;
use crate::repository::member::MemberRepository;
use crate::repository::sale::{SaleFilter, SaleRepository};
use crate::repository::sequence::SequenceRepository;
use crate::service::{begin_immediate, ServiceError, ServiceResult};

// =============================================================================
// Input
// =============================================================================

/// Input for creating a sale document.
#[derive(Debug, Clone)]
pub struct CreateSale {
    /// Registered member, if any. Verified to exist.
    pub member_code: Option<String>,
    /// Walk-in customer name, if any.
    pub customer_name: Option<String>,
    /// Business date; also selects the code's YYMM period.
    pub txn_date: NaiveDate,
    pub lines: Vec<LineInput>,
    /// Document-level discount amount in minor units.
    pub discount: Money,
    pub payment_method: PaymentMethod,
    pub status: DocumentStatus,
    pub created_by: String,
}

// =============================================================================
// Sale Service
// =============================================================================

/// Service for sale document operations.
#[derive(Debug, Clone)]
pub struct SaleService {
    pool: SqlitePool,
}

impl SaleService {
    pub fn new(pool: SqlitePool) -> Self {
        SaleService { pool }
    }

    /// Creates a sale document with its lines in one transaction.
    ///
    /// A paid sale decreases stock per line through the guarded update;
    /// any shortfall fails the whole document and no stock moves.
    pub async fn create(&self, input: CreateSale) -> ServiceResult<SaleDocument> {
        let (amounts, totals) = pricing::compute_document(&input.lines, input.discount)?;

        let mut tx = begin_immediate(&self.pool).await?;

        if let Some(member_code) = &input.member_code {
            MemberRepository::find_with(&mut *tx, member_code)
                .await?
                .ok_or_else(|| DbError::not_found("Member", member_code))?;
        }

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

        let scope = SequenceScope::sale(input.txn_date);
        let seq = SequenceRepository::claim_with(&mut *tx, &scope).await?;
        let code = scope.format(seq)?;

        let now = Utc::now();
        let doc = SaleDocument {
            code: code.clone(),
            member_code: input.member_code.clone(),
            customer_name: input.customer_name.clone(),
            txn_date: input.txn_date,
            subtotal: totals.subtotal.minor(),
            discount: totals.discount.minor(),
            grand_total: totals.grand_total.minor(),
            payment_method: input.payment_method,
            status: input.status,
            created_by: input.created_by.clone(),
            retired_at: None,
            created_at: now,
            updated_at: now,
        };

        SaleRepository::insert_header_with(&mut *tx, &doc)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => ServiceError::DuplicateCode { code: code.clone() },
                other => other.into(),
            })?;

        for ((line, amount), item) in input.lines.iter().zip(&amounts).zip(&snapshots) {
            let row = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_code: code.clone(),
                item_code: line.item_code.clone(),
                item_name: item.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.minor(),
                discount_bps: line.discount_bps as i64,
                discount_amount: amount.discount_amount.minor(),
                line_total: amount.line_total.minor(),
                created_at: now,
            };
            SaleRepository::insert_line_with(&mut *tx, &row).await?;
        }

        if stock_effect_on_create(input.status) == StockEffect::Apply {
            for (line, item) in input.lines.iter().zip(&snapshots) {
                let applied =
                    ItemRepository::decrease_stock_with(&mut *tx, &line.item_code, line.quantity, now)
                        .await?;
                if !applied {
                    return Err(CoreError::InsufficientStock {
                        item_code: line.item_code.clone(),
                        available: item.stock,
                        requested: line.quantity,
                    }
                    .into());
                }
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            code = %doc.code,
            grand_total = doc.grand_total,
            method = ?doc.payment_method,
            status = ?doc.status,
            "Sale created"
        );
        Ok(doc)
    }

    /// Fetches a document with its lines.
    pub async fn get(&self, code: &str) -> ServiceResult<(SaleDocument, Vec<SaleLine>)> {
        let repo = SaleRepository::new(self.pool.clone());
        let doc = repo.get(code).await?;
        let lines = repo.lines(code).await?;
        Ok((doc, lines))
    }

    /// Lists documents matching the filter, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> ServiceResult<Vec<SaleDocument>> {
        Ok(SaleRepository::new(self.pool.clone()).list(filter).await?)
    }

    /// Moves a document to a new status, applying the stock effect of the
    /// transition from the table in kasira-core.
    pub async fn set_status(
        &self,
        code: &str,
        new_status: DocumentStatus,
    ) -> ServiceResult<SaleDocument> {
        let mut tx = begin_immediate(&self.pool).await?;

        let doc = SaleRepository::find_with(&mut *tx, code)
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
            // Apply for a sale means goods leave the shelf
            StockEffect::Apply => apply_sale_stock(&mut tx, code, now).await?,
            // Reverse puts them back
            StockEffect::Reverse => {
                let lines = SaleRepository::lines_with(&mut *tx, code).await?;
                for line in &lines {
                    ItemRepository::increase_stock_with(&mut *tx, &line.item_code, line.quantity, now)
                        .await?;
                }
            }
            StockEffect::None => {}
        }

        SaleRepository::update_status_with(&mut *tx, code, new_status, now).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(code, from = ?doc.status, to = ?new_status, "Sale status changed");

        Ok(SaleRepository::new(self.pool.clone()).get(code).await?)
    }

    /// Retires a document: hidden from default listings, stock untouched.
    pub async fn retire(&self, code: &str) -> ServiceResult<()> {
        let now = Utc::now();
        let updated = SaleRepository::set_retired_with(&self.pool, code, Some(now), now).await?;
        if !updated {
            return Err(CoreError::DocumentNotFound(code.to_string()).into());
        }
        info!(code, "Sale retired");
        Ok(())
    }

    /// Restores a retired document.
    pub async fn restore(&self, code: &str) -> ServiceResult<()> {
        let updated = SaleRepository::set_retired_with(&self.pool, code, None, Utc::now()).await?;
        if !updated {
            return Err(CoreError::DocumentNotFound(code.to_string()).into());
        }
        info!(code, "Sale restored");
        Ok(())
    }

    /// Permanently deletes a document and its lines.
    ///
    /// Paid documents are refused: cancel first so the stock effect stays
    /// accounted for.
    pub async fn hard_delete(&self, code: &str) -> ServiceResult<()> {
        let mut tx = begin_immediate(&self.pool).await?;

        let doc = SaleRepository::find_with(&mut *tx, code)
            .await?
            .ok_or_else(|| CoreError::DocumentNotFound(code.to_string()))?;

        if doc.status == DocumentStatus::Paid {
            return Err(CoreError::InvalidStatusTransition {
                from: "Paid".to_string(),
                to: "Deleted".to_string(),
            }
            .into());
        }

        SaleRepository::delete_lines_with(&mut *tx, code).await?;
        SaleRepository::delete_header_with(&mut *tx, code).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(code, "Sale deleted");
        Ok(())
    }
}

/// Decreases stock for every line of a sale moving to paid.
async fn apply_sale_stock(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    code: &str,
    now: chrono::DateTime<Utc>,
) -> ServiceResult<()> {
    let lines = SaleRepository::lines_with(&mut **tx, code).await?;
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
