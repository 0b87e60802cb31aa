//! # Report Service
//!
//! Read-only aggregation over non-retired documents.
//!
//! ## Degradation Contract
//! A report is decoration, not a ledger: when an aggregation query fails,
//! the method logs the diagnostic and returns an empty result instead of
//! propagating the error, so a broken dashboard panel never takes the
//! transaction screens down with it.
//!
//! ## Scope Rules
//! - Totals count only `paid` documents; the row listing shows every
//!   active document with its status so pending work stays visible
//! - Retired documents are excluded everywhere
//! - Member scopes (member-only, non-member-only, or one member's code)
//!   restrict the report to sales, since purchases carry no member; a
//!   supplier filter does the inverse
//! - Percentages are the caller's job; this layer hands out counts and
//!   totals only

use chrono::NaiveDate;
use kasira_core::types::{DocumentStatus, PaymentMethod};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::warn;

use crate::error::DbResult;

// =============================================================================
// Scopes and Filter
// =============================================================================

/// Which document kinds a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxnScope {
    #[default]
    All,
    SalesOnly,
    PurchasesOnly,
}

/// Which counterparties a report covers. Anything narrower than `All`
/// restricts the report to sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterpartyScope {
    #[default]
    All,
    MemberOnly,
    NonMemberOnly,
}

/// Filter for the period report.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub txn_scope: TxnScope,
    pub counterparty: CounterpartyScope,
    /// Scope to one member's sales; zeroes the purchase side.
    pub member_code: Option<String>,
    /// Scope to one supplier's purchases; zeroes the sale side.
    pub supplier_id: Option<String>,
}

impl ReportFilter {
    fn includes_sales(&self) -> bool {
        self.txn_scope != TxnScope::PurchasesOnly && self.supplier_id.is_none()
    }

    fn includes_purchases(&self) -> bool {
        self.txn_scope != TxnScope::SalesOnly
            && self.counterparty == CounterpartyScope::All
            && self.member_code.is_none()
    }
}

// =============================================================================
// Aggregate Types
// =============================================================================

/// One document in the period report. Sales and purchases are merged into
/// one stream; purchases carry no payment method.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ReportRow {
    pub txn_date: NaiveDate,
    pub code: String,
    /// Member name when the sale has one, otherwise the free-text customer
    /// name; supplier name for purchases. `None` for anonymous walk-ins.
    pub counterparty: Option<String>,
    pub subtotal: i64,
    pub discount: i64,
    pub grand_total: i64,
    pub payment_method: Option<PaymentMethod>,
    pub status: DocumentStatus,
}

/// Paid totals over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub sales_count: i64,
    pub sales_total: i64,
    pub purchases_count: i64,
    pub purchases_total: i64,
}

impl ReportSummary {
    /// Sales minus purchases over the period.
    pub fn net(&self) -> i64 {
        self.sales_total - self.purchases_total
    }
}

/// The period report: every active document in scope plus paid totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportOutput {
    /// Merged document stream, newest first (`txn_date DESC, code DESC`).
    pub rows: Vec<ReportRow>,
    pub totals: ReportSummary,
}

/// One business day of paid sales.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DailySummary {
    pub day: NaiveDate,
    pub transaction_count: i64,
    pub total: i64,
    pub total_discount: i64,
    pub units_sold: i64,
}

impl DailySummary {
    /// Mean paid-sale value for the day; zero when the day has no sales.
    pub fn average_transaction_value(&self) -> i64 {
        if self.transaction_count == 0 {
            0
        } else {
            self.total / self.transaction_count
        }
    }
}

/// One item's paid-sales performance.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TopItem {
    pub item_code: String,
    pub item_name: String,
    pub quantity_sold: i64,
    pub revenue: i64,
    /// Distinct paid sales the item appeared on.
    pub transaction_count: i64,
}

impl TopItem {
    /// Mean units per sale that included this item.
    pub fn average_quantity_per_transaction(&self) -> f64 {
        if self.transaction_count == 0 {
            0.0
        } else {
            self.quantity_sold as f64 / self.transaction_count as f64
        }
    }
}

/// Paid sales grouped by payment method.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PaymentBreakdown {
    pub payment_method: PaymentMethod,
    pub transaction_count: i64,
    pub total: i64,
}

/// Paid sales split between member and walk-in counterparties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CounterpartySplit {
    pub member_count: i64,
    pub member_total: i64,
    pub non_member_count: i64,
    pub non_member_total: i64,
}

/// Paid sales grouped by member.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MemberBreakdown {
    pub member_code: String,
    pub member_name: String,
    pub transaction_count: i64,
    pub total: i64,
}

#[derive(sqlx::FromRow)]
struct CountTotal {
    cnt: i64,
    total: i64,
}

// =============================================================================
// Report Service
// =============================================================================

/// Service for aggregation queries.
#[derive(Debug, Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(pool: SqlitePool) -> Self {
        ReportService { pool }
    }

    /// The period report: merged document rows plus paid totals.
    pub async fn summarize(&self, filter: &ReportFilter) -> ReportOutput {
        match self.try_summarize(filter).await {
            Ok(output) => output,
            Err(e) => degrade("summarize", e),
        }
    }

    async fn try_summarize(&self, filter: &ReportFilter) -> DbResult<ReportOutput> {
        let mut output = ReportOutput::default();

        if filter.includes_sales() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                r#"
                SELECT s.txn_date, s.code,
                       COALESCE(m.name, s.customer_name) AS counterparty,
                       s.subtotal, s.discount, s.grand_total,
                       s.payment_method, s.status
                FROM sales s
                LEFT JOIN members m ON m.code = s.member_code
                WHERE s.retired_at IS NULL
                "#,
            );
            push_date_range(&mut qb, filter.date_from, filter.date_to);
            match filter.counterparty {
                CounterpartyScope::All => {}
                CounterpartyScope::MemberOnly => {
                    qb.push(" AND s.member_code IS NOT NULL");
                }
                CounterpartyScope::NonMemberOnly => {
                    qb.push(" AND s.member_code IS NULL");
                }
            }
            if let Some(member_code) = &filter.member_code {
                qb.push(" AND s.member_code = ");
                qb.push_bind(member_code.clone());
            }
            let rows: Vec<ReportRow> = qb.build_query_as().fetch_all(&self.pool).await?;
            output.rows.extend(rows);
        }

        if filter.includes_purchases() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                r#"
                SELECT p.txn_date, p.code,
                       sp.name AS counterparty,
                       p.subtotal, p.discount, p.grand_total,
                       NULL AS payment_method, p.status
                FROM purchases p
                LEFT JOIN suppliers sp ON sp.id = p.supplier_id
                WHERE p.retired_at IS NULL
                "#,
            );
            push_date_range(&mut qb, filter.date_from, filter.date_to);
            if let Some(supplier_id) = &filter.supplier_id {
                qb.push(" AND p.supplier_id = ");
                qb.push_bind(supplier_id.clone());
            }
            let rows: Vec<ReportRow> = qb.build_query_as().fetch_all(&self.pool).await?;
            output.rows.extend(rows);
        }

        // Each side arrives ordered from its own table; the merged stream
        // needs one final sort. Code is the tie-breaker for same-day rows.
        output
            .rows
            .sort_by(|a, b| b.txn_date.cmp(&a.txn_date).then(b.code.cmp(&a.code)));

        output.totals = self.try_totals(filter).await?;
        Ok(output)
    }

    async fn try_totals(&self, filter: &ReportFilter) -> DbResult<ReportSummary> {
        let mut totals = ReportSummary::default();

        if filter.includes_sales() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                r#"SELECT COUNT(*) AS cnt, COALESCE(SUM(grand_total), 0) AS total
                   FROM sales WHERE status = 'paid' AND retired_at IS NULL"#,
            );
            push_date_range(&mut qb, filter.date_from, filter.date_to);
            match filter.counterparty {
                CounterpartyScope::All => {}
                CounterpartyScope::MemberOnly => {
                    qb.push(" AND member_code IS NOT NULL");
                }
                CounterpartyScope::NonMemberOnly => {
                    qb.push(" AND member_code IS NULL");
                }
            }
            if let Some(member_code) = &filter.member_code {
                qb.push(" AND member_code = ");
                qb.push_bind(member_code.clone());
            }
            let row: CountTotal = qb.build_query_as().fetch_one(&self.pool).await?;
            totals.sales_count = row.cnt;
            totals.sales_total = row.total;
        }

        if filter.includes_purchases() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                r#"SELECT COUNT(*) AS cnt, COALESCE(SUM(grand_total), 0) AS total
                   FROM purchases WHERE status = 'paid' AND retired_at IS NULL"#,
            );
            push_date_range(&mut qb, filter.date_from, filter.date_to);
            if let Some(supplier_id) = &filter.supplier_id {
                qb.push(" AND supplier_id = ");
                qb.push_bind(supplier_id.clone());
            }
            let row: CountTotal = qb.build_query_as().fetch_one(&self.pool).await?;
            totals.purchases_count = row.cnt;
            totals.purchases_total = row.total;
        }

        Ok(totals)
    }

    /// Paid sales per business day, oldest first. Days without sales are
    /// absent, not zero-filled.
    pub async fn daily_summary(&self, from: NaiveDate, to: NaiveDate) -> Vec<DailySummary> {
        let result = sqlx::query_as::<_, DailySummary>(
            r#"
            SELECT s.txn_date AS day,
                   COUNT(*) AS transaction_count,
                   COALESCE(SUM(s.grand_total), 0) AS total,
                   COALESCE(SUM(s.discount), 0) AS total_discount,
                   COALESCE(SUM((SELECT SUM(l.quantity)
                                 FROM sale_lines l
                                 WHERE l.sale_code = s.code)), 0) AS units_sold
            FROM sales s
            WHERE s.status = 'paid' AND s.retired_at IS NULL
              AND s.txn_date >= ?1 AND s.txn_date <= ?2
            GROUP BY s.txn_date
            ORDER BY s.txn_date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows,
            Err(e) => degrade("daily_summary", e.into()),
        }
    }

    /// Best-selling items over the period, by quantity then revenue.
    pub async fn top_items(&self, from: NaiveDate, to: NaiveDate, limit: i64) -> Vec<TopItem> {
        let result = sqlx::query_as::<_, TopItem>(
            r#"
            SELECT l.item_code,
                   l.item_name,
                   COALESCE(SUM(l.quantity), 0) AS quantity_sold,
                   COALESCE(SUM(l.line_total), 0) AS revenue,
                   COUNT(DISTINCT l.sale_code) AS transaction_count
            FROM sale_lines l
            JOIN sales s ON s.code = l.sale_code
            WHERE s.status = 'paid' AND s.retired_at IS NULL
              AND s.txn_date >= ?1 AND s.txn_date <= ?2
            GROUP BY l.item_code, l.item_name
            ORDER BY quantity_sold DESC, revenue DESC, l.item_code
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows,
            Err(e) => degrade("top_items", e.into()),
        }
    }

    /// Paid sales grouped by payment method.
    pub async fn payment_breakdown(&self, from: NaiveDate, to: NaiveDate) -> Vec<PaymentBreakdown> {
        let result = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT payment_method,
                   COUNT(*) AS transaction_count,
                   COALESCE(SUM(grand_total), 0) AS total
            FROM sales
            WHERE status = 'paid' AND retired_at IS NULL
              AND txn_date >= ?1 AND txn_date <= ?2
            GROUP BY payment_method
            ORDER BY total DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows,
            Err(e) => degrade("payment_breakdown", e.into()),
        }
    }

    /// Paid sales split between member and walk-in counterparties.
    pub async fn counterparty_split(&self, from: NaiveDate, to: NaiveDate) -> CounterpartySplit {
        let result = sqlx::query_as::<_, CounterpartySplit>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN member_code IS NOT NULL THEN 1 ELSE 0 END), 0)
                       AS member_count,
                   COALESCE(SUM(CASE WHEN member_code IS NOT NULL THEN grand_total ELSE 0 END), 0)
                       AS member_total,
                   COALESCE(SUM(CASE WHEN member_code IS NULL THEN 1 ELSE 0 END), 0)
                       AS non_member_count,
                   COALESCE(SUM(CASE WHEN member_code IS NULL THEN grand_total ELSE 0 END), 0)
                       AS non_member_total
            FROM sales
            WHERE status = 'paid' AND retired_at IS NULL
              AND txn_date >= ?1 AND txn_date <= ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(split) => split,
            Err(e) => degrade("counterparty_split", e.into()),
        }
    }

    /// Paid member sales grouped by member, biggest spenders first.
    /// Walk-in sales carry no member and are excluded.
    pub async fn member_breakdown(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: i64,
    ) -> Vec<MemberBreakdown> {
        let result = sqlx::query_as::<_, MemberBreakdown>(
            r#"
            SELECT s.member_code,
                   m.name AS member_name,
                   COUNT(*) AS transaction_count,
                   COALESCE(SUM(s.grand_total), 0) AS total
            FROM sales s
            JOIN members m ON m.code = s.member_code
            WHERE s.status = 'paid' AND s.retired_at IS NULL
              AND s.member_code IS NOT NULL
              AND s.txn_date >= ?1 AND s.txn_date <= ?2
            GROUP BY s.member_code, m.name
            ORDER BY total DESC, s.member_code
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows,
            Err(e) => degrade("member_breakdown", e.into()),
        }
    }
}

fn push_date_range(
    qb: &mut QueryBuilder<'_, Sqlite>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) {
    if let Some(from) = from {
        qb.push(" AND txn_date >= ");
        qb.push_bind(from);
    }
    if let Some(to) = to {
        qb.push(" AND txn_date <= ");
        qb.push_bind(to);
    }
}

fn degrade<T: Default>(query: &'static str, err: crate::error::DbError) -> T {
    warn!(query, error = %err, "Report aggregation failed; returning empty result");
    T::default()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::catalog::{NewItem, NewMember, NewSupplier};
    use crate::service::purchase::CreatePurchase;
    use crate::service::sale::CreateSale;
    use kasira_core::money::Money;
    use kasira_core::pricing::LineInput;
    use kasira_core::types::DocumentStatus;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed_item(db: &Database, name: &str, stock: i64) -> String {
        db.catalog()
            .create_item(NewItem {
                name: name.to_string(),
                description: None,
                sell_price: Money::from_minor(10_000),
                opening_stock: stock,
                min_stock: 0,
            })
            .await
            .unwrap()
            .code
    }

    async fn paid_sale(
        db: &Database,
        item: &str,
        qty: i64,
        day: NaiveDate,
        member: Option<String>,
        method: PaymentMethod,
    ) {
        db.sale_service()
            .create(CreateSale {
                member_code: member,
                customer_name: None,
                txn_date: day,
                lines: vec![LineInput {
                    item_code: item.to_string(),
                    quantity: qty,
                    unit_price: Money::from_minor(10_000),
                    discount_bps: 0,
                }],
                discount: Money::zero(),
                payment_method: method,
                status: DocumentStatus::Paid,
                created_by: "kasir".to_string(),
            })
            .await
            .unwrap();
    }

    async fn paid_purchase(db: &Database, item: &str, qty: i64, day: NaiveDate) -> String {
        let supplier = db
            .catalog()
            .create_supplier(NewSupplier {
                name: "Grosir Makmur".to_string(),
                contact: None,
                address: None,
            })
            .await
            .unwrap();
        db.purchase_service()
            .create(CreatePurchase {
                supplier_id: supplier.id,
                txn_date: day,
                lines: vec![LineInput {
                    item_code: item.to_string(),
                    quantity: qty,
                    unit_price: Money::from_minor(8_000),
                    discount_bps: 0,
                }],
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "admin".to_string(),
            })
            .await
            .unwrap()
            .code
    }

    #[tokio::test]
    async fn test_totals_count_only_paid() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;

        paid_sale(&db, &item, 2, date(2025, 1, 10), None, PaymentMethod::Cash).await;

        // A pending sale appears as a row but not in the totals
        db.sale_service()
            .create(CreateSale {
                member_code: None,
                customer_name: None,
                txn_date: date(2025, 1, 10),
                lines: vec![LineInput {
                    item_code: item.clone(),
                    quantity: 1,
                    unit_price: Money::from_minor(10_000),
                    discount_bps: 0,
                }],
                discount: Money::zero(),
                payment_method: PaymentMethod::Cash,
                status: DocumentStatus::Pending,
                created_by: "kasir".to_string(),
            })
            .await
            .unwrap();

        let report = db.reports().summarize(&ReportFilter::default()).await;
        assert_eq!(report.totals.sales_count, 1);
        assert_eq!(report.totals.sales_total, 20_000);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].status, DocumentStatus::Pending);
    }

    #[tokio::test]
    async fn test_rows_merge_both_sides_newest_first() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;

        paid_sale(&db, &item, 3, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        let purchase_code = paid_purchase(&db, &item, 10, date(2025, 1, 11)).await;

        let report = db.reports().summarize(&ReportFilter::default()).await;

        assert_eq!(report.rows.len(), 2);
        // Newer purchase first, then the sale
        assert_eq!(report.rows[0].code, purchase_code);
        assert_eq!(report.rows[0].counterparty.as_deref(), Some("Grosir Makmur"));
        assert_eq!(report.rows[0].payment_method, None);
        assert_eq!(report.rows[1].payment_method, Some(PaymentMethod::Cash));

        assert_eq!(report.totals.sales_total, 30_000);
        assert_eq!(report.totals.purchases_total, 80_000);
        assert_eq!(report.totals.net(), -50_000);
    }

    #[tokio::test]
    async fn test_member_name_wins_over_customer_name() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;
        let member = db
            .catalog()
            .create_member(NewMember {
                name: "Budi".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        db.sale_service()
            .create(CreateSale {
                member_code: Some(member.code.clone()),
                customer_name: Some("scribbled name".to_string()),
                txn_date: date(2025, 1, 10),
                lines: vec![LineInput {
                    item_code: item.clone(),
                    quantity: 1,
                    unit_price: Money::from_minor(10_000),
                    discount_bps: 0,
                }],
                discount: Money::zero(),
                payment_method: PaymentMethod::Cash,
                status: DocumentStatus::Paid,
                created_by: "kasir".to_string(),
            })
            .await
            .unwrap();

        let report = db.reports().summarize(&ReportFilter::default()).await;
        assert_eq!(report.rows[0].counterparty.as_deref(), Some("Budi"));
    }

    #[tokio::test]
    async fn test_member_filter_scopes_to_sales() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;
        let member = db
            .catalog()
            .create_member(NewMember {
                name: "Budi".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        paid_sale(
            &db,
            &item,
            2,
            date(2025, 1, 10),
            Some(member.code.clone()),
            PaymentMethod::Cash,
        )
        .await;
        paid_sale(&db, &item, 5, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_purchase(&db, &item, 10, date(2025, 1, 10)).await;

        let report = db
            .reports()
            .summarize(&ReportFilter {
                member_code: Some(member.code),
                ..Default::default()
            })
            .await;

        assert_eq!(report.totals.sales_count, 1);
        assert_eq!(report.totals.sales_total, 20_000);
        assert_eq!(report.totals.purchases_count, 0);
        assert_eq!(report.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_counterparty_scope_non_member_only() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;
        let member = db
            .catalog()
            .create_member(NewMember {
                name: "Siti".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        paid_sale(
            &db,
            &item,
            2,
            date(2025, 1, 10),
            Some(member.code),
            PaymentMethod::Cash,
        )
        .await;
        paid_sale(&db, &item, 5, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_purchase(&db, &item, 10, date(2025, 1, 10)).await;

        let report = db
            .reports()
            .summarize(&ReportFilter {
                counterparty: CounterpartyScope::NonMemberOnly,
                ..Default::default()
            })
            .await;

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.totals.sales_total, 50_000);
        assert_eq!(report.totals.purchases_count, 0);
    }

    #[tokio::test]
    async fn test_txn_scope_sales_only_drops_purchases() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;

        paid_sale(&db, &item, 3, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_purchase(&db, &item, 10, date(2025, 1, 11)).await;

        let report = db
            .reports()
            .summarize(&ReportFilter {
                txn_scope: TxnScope::SalesOnly,
                ..Default::default()
            })
            .await;

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.totals.purchases_count, 0);
        assert_eq!(report.totals.sales_total, 30_000);
    }

    #[tokio::test]
    async fn test_daily_summary_sums_to_period_total() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;

        paid_sale(&db, &item, 1, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_sale(&db, &item, 2, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_sale(&db, &item, 3, date(2025, 1, 12), None, PaymentMethod::Cash).await;

        let from = date(2025, 1, 1);
        let to = date(2025, 1, 31);

        let days = db.reports().daily_summary(from, to).await;
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, date(2025, 1, 10));
        assert_eq!(days[0].transaction_count, 2);
        assert_eq!(days[0].units_sold, 3);
        assert_eq!(days[0].total_discount, 0);
        // 30,000 over 2 sales
        assert_eq!(days[0].average_transaction_value(), 15_000);

        let report = db
            .reports()
            .summarize(&ReportFilter {
                date_from: Some(from),
                date_to: Some(to),
                ..Default::default()
            })
            .await;
        let daily_total: i64 = days.iter().map(|d| d.total).sum();
        assert_eq!(daily_total, report.totals.sales_total);
    }

    #[tokio::test]
    async fn test_top_items_ordering_and_average() {
        let db = test_db().await;
        let fast = seed_item(&db, "Fast Mover", 100).await;
        let slow = seed_item(&db, "Slow Mover", 100).await;

        paid_sale(&db, &fast, 4, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_sale(&db, &fast, 5, date(2025, 1, 11), None, PaymentMethod::Cash).await;
        paid_sale(&db, &slow, 2, date(2025, 1, 10), None, PaymentMethod::Cash).await;

        let top = db.reports().top_items(date(2025, 1, 1), date(2025, 1, 31), 10).await;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item_name, "Fast Mover");
        assert_eq!(top[0].quantity_sold, 9);
        assert_eq!(top[0].revenue, 90_000);
        assert_eq!(top[0].transaction_count, 2);
        assert!((top[0].average_quantity_per_transaction() - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_payment_breakdown() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;

        paid_sale(&db, &item, 1, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_sale(&db, &item, 1, date(2025, 1, 10), None, PaymentMethod::Cash).await;
        paid_sale(&db, &item, 5, date(2025, 1, 10), None, PaymentMethod::Transfer).await;

        let rows = db
            .reports()
            .payment_breakdown(date(2025, 1, 1), date(2025, 1, 31))
            .await;

        assert_eq!(rows.len(), 2);
        // Ordered by total descending: transfer 50,000 before cash 20,000
        assert_eq!(rows[0].payment_method, PaymentMethod::Transfer);
        assert_eq!(rows[0].total, 50_000);
        assert_eq!(rows[1].transaction_count, 2);
    }

    #[tokio::test]
    async fn test_counterparty_split() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;
        let member = db
            .catalog()
            .create_member(NewMember {
                name: "Siti".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        paid_sale(
            &db,
            &item,
            2,
            date(2025, 1, 10),
            Some(member.code),
            PaymentMethod::Cash,
        )
        .await;
        paid_sale(&db, &item, 9, date(2025, 1, 10), None, PaymentMethod::Cash).await;

        let split = db
            .reports()
            .counterparty_split(date(2025, 1, 1), date(2025, 1, 31))
            .await;

        assert_eq!(split.member_count, 1);
        assert_eq!(split.member_total, 20_000);
        assert_eq!(split.non_member_count, 1);
        assert_eq!(split.non_member_total, 90_000);
    }

    #[tokio::test]
    async fn test_member_breakdown_excludes_walk_ins() {
        let db = test_db().await;
        let item = seed_item(&db, "Sugar 1kg", 100).await;
        let member = db
            .catalog()
            .create_member(NewMember {
                name: "Siti".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        paid_sale(
            &db,
            &item,
            2,
            date(2025, 1, 10),
            Some(member.code.clone()),
            PaymentMethod::Cash,
        )
        .await;
        paid_sale(&db, &item, 9, date(2025, 1, 10), None, PaymentMethod::Cash).await;

        let rows = db
            .reports()
            .member_breakdown(date(2025, 1, 1), date(2025, 1, 31), 10)
            .await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_name, "Siti");
        assert_eq!(rows[0].total, 20_000);
    }

    #[tokio::test]
    async fn test_empty_range_is_zeroed() {
        let db = test_db().await;

        let report = db
            .reports()
            .summarize(&ReportFilter {
                date_from: Some(date(2030, 1, 1)),
                date_to: Some(date(2030, 1, 31)),
                ..Default::default()
            })
            .await;

        assert_eq!(report, ReportOutput::default());
        assert!(db
            .reports()
            .daily_summary(date(2030, 1, 1), date(2030, 1, 31))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_degrades_to_empty_when_store_fails() {
        let db = test_db().await;
        db.close().await;

        // A dead pool must yield empty aggregates, not an error
        let report = db.reports().summarize(&ReportFilter::default()).await;
        assert_eq!(report, ReportOutput::default());
        assert!(db
            .reports()
            .top_items(date(2025, 1, 1), date(2025, 1, 31), 10)
            .await
            .is_empty());
    }
}
