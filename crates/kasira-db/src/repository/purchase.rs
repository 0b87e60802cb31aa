//! # Purchase Repository
//!
//! Headers and lines for purchase documents.
//!
//! Repositories here only move rows; the invariants (header totals equal
//! line sums, stock moves only on paid documents) are enforced by
//! `service::purchase`, which composes these methods inside one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use kasira_core::types::{DocumentStatus, PurchaseDocument, PurchaseLine};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::repository::LifecycleScope;

const SELECT_PURCHASE: &str = r#"
    SELECT code, supplier_id, txn_date, subtotal, discount, grand_total,
           status, created_by, retired_at, created_at, updated_at
    FROM purchases
"#;

const SELECT_LINE: &str = r#"
    SELECT id, purchase_code, item_code, item_name, quantity, unit_price,
           discount_bps, discount_amount, line_total, created_at
    FROM purchase_lines
"#;

/// Filter for purchase listings.
///
/// Results are always ordered by `(txn_date DESC, code DESC)` so that the
/// newest business day comes first and same-day documents appear in reverse
/// creation order; the code tie-breaker keeps pagination stable.
#[derive(Debug, Clone, Default)]
pub struct PurchaseFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<DocumentStatus>,
    pub supplier_id: Option<String>,
    /// Operator who recorded the document.
    pub created_by: Option<String>,
    /// Grand-total bounds in minor units.
    pub min_total: Option<i64>,
    pub max_total: Option<i64>,
    /// Substring match across code, supplier name, and date-as-text.
    pub search: Option<String>,
    pub lifecycle: LifecycleScope,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository for the `purchases` and `purchase_lines` tables.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find(&self, code: &str) -> DbResult<Option<PurchaseDocument>> {
        Self::find_with(&self.pool, code).await
    }

    pub async fn find_with<'e, E>(executor: E, code: &str) -> DbResult<Option<PurchaseDocument>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let doc =
            sqlx::query_as::<_, PurchaseDocument>(&format!("{SELECT_PURCHASE} WHERE code = ?1"))
                .bind(code)
                .fetch_optional(executor)
                .await?;

        Ok(doc)
    }

    pub async fn get(&self, code: &str) -> DbResult<PurchaseDocument> {
        self.find(code)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", code))
    }

    /// Fetches the lines of a document in insertion order.
    pub async fn lines(&self, code: &str) -> DbResult<Vec<PurchaseLine>> {
        Self::lines_with(&self.pool, code).await
    }

    pub async fn lines_with<'e, E>(executor: E, code: &str) -> DbResult<Vec<PurchaseLine>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let lines = sqlx::query_as::<_, PurchaseLine>(&format!(
            "{SELECT_LINE} WHERE purchase_code = ?1 ORDER BY id"
        ))
        .bind(code)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    /// Lists documents matching the filter, newest first.
    pub async fn list(&self, filter: &PurchaseFilter) -> DbResult<Vec<PurchaseDocument>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT p.code, p.supplier_id, p.txn_date, p.subtotal, p.discount,
                   p.grand_total, p.status, p.created_by, p.retired_at,
                   p.created_at, p.updated_at
            FROM purchases p
            LEFT JOIN suppliers sp ON sp.id = p.supplier_id
            WHERE 1=1
            "#,
        );

        match filter.lifecycle {
            LifecycleScope::Active => {
                qb.push(" AND p.retired_at IS NULL");
            }
            LifecycleScope::Retired => {
                qb.push(" AND p.retired_at IS NOT NULL");
            }
            LifecycleScope::All => {}
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND p.txn_date >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND p.txn_date <= ");
            qb.push_bind(to);
        }
        if let Some(status) = filter.status {
            qb.push(" AND p.status = ");
            qb.push_bind(status);
        }
        if let Some(supplier_id) = &filter.supplier_id {
            qb.push(" AND p.supplier_id = ");
            qb.push_bind(supplier_id.clone());
        }
        if let Some(created_by) = &filter.created_by {
            qb.push(" AND p.created_by = ");
            qb.push_bind(created_by.clone());
        }
        if let Some(min) = filter.min_total {
            qb.push(" AND p.grand_total >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.max_total {
            qb.push(" AND p.grand_total <= ");
            qb.push_bind(max);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (p.code LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR sp.name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.txn_date LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY p.txn_date DESC, p.code DESC");

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
            qb.push(" OFFSET ");
            qb.push_bind(filter.offset.unwrap_or(0));
        }

        let docs = qb
            .build_query_as::<PurchaseDocument>()
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn insert_header_with<'e, E>(executor: E, doc: &PurchaseDocument) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO purchases
                (code, supplier_id, txn_date, subtotal, discount, grand_total,
                 status, created_by, retired_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&doc.code)
        .bind(&doc.supplier_id)
        .bind(doc.txn_date)
        .bind(doc.subtotal)
        .bind(doc.discount)
        .bind(doc.grand_total)
        .bind(doc.status)
        .bind(&doc.created_by)
        .bind(doc.retired_at)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_line_with<'e, E>(executor: E, line: &PurchaseLine) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO purchase_lines
                (id, purchase_code, item_code, item_name, quantity, unit_price,
                 discount_bps, discount_amount, line_total, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.id)
        .bind(&line.purchase_code)
        .bind(&line.item_code)
        .bind(&line.item_name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.discount_bps)
        .bind(line.discount_amount)
        .bind(line.line_total)
        .bind(line.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update_status_with<'e, E>(
        executor: E,
        code: &str,
        status: DocumentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("UPDATE purchases SET status = ?2, updated_at = ?3 WHERE code = ?1")
                .bind(code)
                .bind(status)
                .bind(now)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_retired_with<'e, E>(
        executor: E,
        code: &str,
        retired_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("UPDATE purchases SET retired_at = ?2, updated_at = ?3 WHERE code = ?1")
                .bind(code)
                .bind(retired_at)
                .bind(now)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the lines of a document. Runs before the header delete.
    pub async fn delete_lines_with<'e, E>(executor: E, code: &str) -> DbResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM purchase_lines WHERE purchase_code = ?1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_header_with<'e, E>(executor: E, code: &str) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM purchases WHERE code = ?1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
