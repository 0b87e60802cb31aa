//! # Sale Repository
//!
//! Headers and lines for sale documents. Mirrors `repository::purchase`
//! with the sale-specific columns (counterparty, payment method).

use chrono::{DateTime, NaiveDate, Utc};
use kasira_core::types::{DocumentStatus, PaymentMethod, SaleDocument, SaleLine};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::repository::LifecycleScope;

const SELECT_SALE: &str = r#"
    SELECT code, member_code, customer_name, txn_date, subtotal, discount,
           grand_total, payment_method, status, created_by, retired_at,
           created_at, updated_at
    FROM sales
"#;

const SELECT_LINE: &str = r#"
    SELECT id, sale_code, item_code, item_name, quantity, unit_price,
           discount_bps, discount_amount, line_total, created_at
    FROM sale_lines
"#;

/// Filter for sale listings, ordered `(txn_date DESC, code DESC)`.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<DocumentStatus>,
    pub member_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    /// Operator who recorded the document.
    pub created_by: Option<String>,
    /// Grand-total bounds in minor units.
    pub min_total: Option<i64>,
    pub max_total: Option<i64>,
    /// Substring match across code, counterparty name, and date-as-text.
    pub search: Option<String>,
    pub lifecycle: LifecycleScope,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository for the `sales` and `sale_lines` tables.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find(&self, code: &str) -> DbResult<Option<SaleDocument>> {
        Self::find_with(&self.pool, code).await
    }

    pub async fn find_with<'e, E>(executor: E, code: &str) -> DbResult<Option<SaleDocument>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let doc = sqlx::query_as::<_, SaleDocument>(&format!("{SELECT_SALE} WHERE code = ?1"))
            .bind(code)
            .fetch_optional(executor)
            .await?;

        Ok(doc)
    }

    pub async fn get(&self, code: &str) -> DbResult<SaleDocument> {
        self.find(code)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", code))
    }

    /// Fetches the lines of a document in insertion order.
    pub async fn lines(&self, code: &str) -> DbResult<Vec<SaleLine>> {
        Self::lines_with(&self.pool, code).await
    }

    pub async fn lines_with<'e, E>(executor: E, code: &str) -> DbResult<Vec<SaleLine>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let lines = sqlx::query_as::<_, SaleLine>(&format!(
            "{SELECT_LINE} WHERE sale_code = ?1 ORDER BY id"
        ))
        .bind(code)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    /// Lists documents matching the filter, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<SaleDocument>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT s.code, s.member_code, s.customer_name, s.txn_date, s.subtotal,
                   s.discount, s.grand_total, s.payment_method, s.status,
                   s.created_by, s.retired_at, s.created_at, s.updated_at
            FROM sales s
            LEFT JOIN members m ON m.code = s.member_code
            WHERE 1=1
            "#,
        );

        match filter.lifecycle {
            LifecycleScope::Active => {
                qb.push(" AND s.retired_at IS NULL");
            }
            LifecycleScope::Retired => {
                qb.push(" AND s.retired_at IS NOT NULL");
            }
            LifecycleScope::All => {}
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND s.txn_date >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND s.txn_date <= ");
            qb.push_bind(to);
        }
        if let Some(status) = filter.status {
            qb.push(" AND s.status = ");
            qb.push_bind(status);
        }
        if let Some(member_code) = &filter.member_code {
            qb.push(" AND s.member_code = ");
            qb.push_bind(member_code.clone());
        }
        if let Some(method) = filter.payment_method {
            qb.push(" AND s.payment_method = ");
            qb.push_bind(method);
        }
        if let Some(created_by) = &filter.created_by {
            qb.push(" AND s.created_by = ");
            qb.push_bind(created_by.clone());
        }
        if let Some(min) = filter.min_total {
            qb.push(" AND s.grand_total >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.max_total {
            qb.push(" AND s.grand_total <= ");
            qb.push_bind(max);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (s.code LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR s.customer_name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR m.name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR s.txn_date LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY s.txn_date DESC, s.code DESC");

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
            qb.push(" OFFSET ");
            qb.push_bind(filter.offset.unwrap_or(0));
        }

        let docs = qb
            .build_query_as::<SaleDocument>()
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn insert_header_with<'e, E>(executor: E, doc: &SaleDocument) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sales
                (code, member_code, customer_name, txn_date, subtotal, discount,
                 grand_total, payment_method, status, created_by, retired_at,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&doc.code)
        .bind(&doc.member_code)
        .bind(&doc.customer_name)
        .bind(doc.txn_date)
        .bind(doc.subtotal)
        .bind(doc.discount)
        .bind(doc.grand_total)
        .bind(doc.payment_method)
        .bind(doc.status)
        .bind(&doc.created_by)
        .bind(doc.retired_at)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_line_with<'e, E>(executor: E, line: &SaleLine) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sale_lines
                (id, sale_code, item_code, item_name, quantity, unit_price,
                 discount_bps, discount_amount, line_total, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_code)
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
        let result = sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE code = ?1")
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
            sqlx::query("UPDATE sales SET retired_at = ?2, updated_at = ?3 WHERE code = ?1")
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
        let result = sqlx::query("DELETE FROM sale_lines WHERE sale_code = ?1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_header_with<'e, E>(executor: E, code: &str) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sales WHERE code = ?1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
