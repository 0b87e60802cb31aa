//! # Item Repository
//!
//! Item CRUD, search, and the guarded stock mutations that enforce the
//! non-negative stock invariant.
//!
//! ## Guarded Decrease
//! ```sql
//! UPDATE items SET stock = stock - ?2
//! WHERE code = ?1 AND stock >= ?2
//! ```
//!
//! The availability check and the subtraction are one statement, so a
//! concurrent sale can never observe stale stock and drive it negative.
//! `rows_affected == 0` means the guard rejected the decrease; the schema's
//! `CHECK (stock >= 0)` is a backstop, not the primary enforcement.

use chrono::{DateTime, Utc};
use kasira_core::types::Item;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};

const SELECT_ITEM: &str = r#"
    SELECT code, name, description, sell_price, stock, min_stock,
           retired_at, created_at, updated_at
    FROM items
"#;

/// Filter for item listings.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Case-insensitive substring match on name or code.
    pub search: Option<String>,
    /// Include retired items (default: active only).
    pub include_retired: bool,
    /// Only items at or below their minimum-stock threshold.
    pub low_stock_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository for the `items` table.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches an item by code, including retired items.
    pub async fn find(&self, code: &str) -> DbResult<Option<Item>> {
        Self::find_with(&self.pool, code).await
    }

    /// Fetches an item on a caller-supplied executor.
    pub async fn find_with<'e, E>(executor: E, code: &str) -> DbResult<Option<Item>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let item = sqlx::query_as::<_, Item>(&format!("{SELECT_ITEM} WHERE code = ?1"))
            .bind(code)
            .fetch_optional(executor)
            .await?;

        Ok(item)
    }

    /// Fetches an item by code or fails with NotFound.
    pub async fn get(&self, code: &str) -> DbResult<Item> {
        self.find(code)
            .await?
            .ok_or_else(|| DbError::not_found("Item", code))
    }

    /// Lists items matching the filter, ordered by code.
    pub async fn list(&self, filter: &ItemFilter) -> DbResult<Vec<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_ITEM);
        qb.push(" WHERE 1=1");

        if !filter.include_retired {
            qb.push(" AND retired_at IS NULL");
        }
        if filter.low_stock_only {
            qb.push(" AND stock <= min_stock");
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR code LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY code");

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
            qb.push(" OFFSET ");
            qb.push_bind(filter.offset.unwrap_or(0));
        }

        let items = qb.build_query_as::<Item>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new item.
    pub async fn insert_with<'e, E>(executor: E, item: &Item) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO items
                (code, name, description, sell_price, stock, min_stock,
                 retired_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.sell_price)
        .bind(item.stock)
        .bind(item.min_stock)
        .bind(item.retired_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Updates an item's descriptive fields. Stock is never set here.
    pub async fn update_info_with<'e, E>(
        executor: E,
        code: &str,
        name: &str,
        description: Option<&str>,
        sell_price: i64,
        min_stock: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = ?2, description = ?3, sell_price = ?4, min_stock = ?5,
                updated_at = ?6
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(description)
        .bind(sell_price)
        .bind(min_stock)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets or clears the retirement timestamp.
    pub async fn set_retired_with<'e, E>(
        executor: E,
        code: &str,
        retired_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE items SET retired_at = ?2, updated_at = ?3 WHERE code = ?1")
            .bind(code)
            .bind(retired_at)
            .bind(now)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes an item row.
    ///
    /// Fails with a foreign-key violation while any document line still
    /// references the item.
    pub async fn delete_with<'e, E>(executor: E, code: &str) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM items WHERE code = ?1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Stock Mutations
    // =========================================================================

    /// Increases stock by `quantity`. Returns false if the item is missing.
    pub async fn increase_stock_with<'e, E>(
        executor: E,
        code: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE items SET stock = stock + ?2, updated_at = ?3 WHERE code = ?1",
        )
        .bind(code)
        .bind(quantity)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decreases stock by `quantity` if and only if enough is available.
    ///
    /// Returns false when the guard rejected the decrease (missing item or
    /// insufficient stock); the caller decides which it was and reports it.
    pub async fn decrease_stock_with<'e, E>(
        executor: E,
        code: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET stock = stock - ?2, updated_at = ?3
            WHERE code = ?1 AND stock >= ?2
            "#,
        )
        .bind(code)
        .bind(quantity)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_item(code: &str, stock: i64) -> Item {
        let now = Utc::now();
        Item {
            code: code.to_string(),
            name: format!("Item {code}"),
            description: None,
            sell_price: 10_000,
            stock,
            min_stock: 5,
            retired_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.items();

        ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 10))
            .await
            .unwrap();

        let item = repo.get("ITM00001").await.unwrap();
        assert_eq!(item.name, "Item ITM00001");
        assert_eq!(item.stock, 10);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = test_db().await;
        let err = db.items().get("ITM99999").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let db = test_db().await;

        ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 0))
            .await
            .unwrap();
        let err = ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 0))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_guarded_decrease_rejects_overdraw() {
        let db = test_db().await;
        let repo = db.items();
        let now = Utc::now();

        ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 2))
            .await
            .unwrap();

        // Requesting 5 from a stock of 2 must change nothing
        let applied = ItemRepository::decrease_stock_with(db.pool(), "ITM00001", 5, now)
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(repo.get("ITM00001").await.unwrap().stock, 2);

        // Exact stock is allowed, down to zero
        let applied = ItemRepository::decrease_stock_with(db.pool(), "ITM00001", 2, now)
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(repo.get("ITM00001").await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_increase_stock() {
        let db = test_db().await;
        let now = Utc::now();

        ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 10))
            .await
            .unwrap();
        ItemRepository::increase_stock_with(db.pool(), "ITM00001", 50, now)
            .await
            .unwrap();

        assert_eq!(db.items().get("ITM00001").await.unwrap().stock, 60);
    }

    #[tokio::test]
    async fn test_list_excludes_retired_by_default() {
        let db = test_db().await;
        let repo = db.items();
        let now = Utc::now();

        ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 1))
            .await
            .unwrap();
        ItemRepository::insert_with(db.pool(), &sample_item("ITM00002", 1))
            .await
            .unwrap();
        ItemRepository::set_retired_with(db.pool(), "ITM00002", Some(now), now)
            .await
            .unwrap();

        let active = repo.list(&ItemFilter::default()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "ITM00001");

        let all = repo
            .list(&ItemFilter {
                include_retired: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = test_db().await;

        // min_stock is 5 in the fixture
        ItemRepository::insert_with(db.pool(), &sample_item("ITM00001", 3))
            .await
            .unwrap();
        ItemRepository::insert_with(db.pool(), &sample_item("ITM00002", 20))
            .await
            .unwrap();

        let low = db
            .items()
            .list(&ItemFilter {
                low_stock_only: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(low.len(), 1);
        assert_eq!(low[0].code, "ITM00001");
    }

    #[tokio::test]
    async fn test_search_matches_name_and_code() {
        let db = test_db().await;

        let mut rice = sample_item("ITM00001", 1);
        rice.name = "Rice 5kg".to_string();
        ItemRepository::insert_with(db.pool(), &rice).await.unwrap();
        ItemRepository::insert_with(db.pool(), &sample_item("ITM00002", 1))
            .await
            .unwrap();

        let by_name = db
            .items()
            .list(&ItemFilter {
                search: Some("rice".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);

        let by_code = db
            .items()
            .list(&ItemFilter {
                search: Some("00002".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_code.len(), 1);
    }
}
