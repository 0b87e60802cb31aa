//! # Sequence Counter Repository
//!
//! Atomic claiming of code sequence values.
//!
//! ## The Claim
//! ```sql
//! INSERT INTO document_counters (kind, period, last_value)
//! VALUES (?, ?, 1)
//! ON CONFLICT (kind, period) DO UPDATE SET last_value = last_value + 1
//! RETURNING last_value
//! ```
//!
//! One statement, one row, no read-modify-write window: two concurrent
//! claimants always observe distinct values. The counter is the single
//! source of truth; sequence values are never derived from the maximum
//! existing code, so hard-deleting the latest document can never cause a
//! code to be reissued.

use kasira_core::codes::SequenceScope;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;

/// Repository for the `document_counters` table.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Claims the next sequence value for a scope on the shared pool.
    pub async fn claim(&self, scope: &SequenceScope) -> DbResult<i64> {
        Self::claim_with(&self.pool, scope).await
    }

    /// Claims the next sequence value on a caller-supplied executor.
    ///
    /// Pass `&mut *tx` to claim inside a document-creation transaction; a
    /// rollback then releases the value along with everything else.
    pub async fn claim_with<'e, E>(executor: E, scope: &SequenceScope) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_counters (kind, period, last_value)
            VALUES (?1, ?2, 1)
            ON CONFLICT (kind, period) DO UPDATE SET last_value = last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(scope.counter_kind)
        .bind(&scope.period)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }

    /// Returns the last claimed value for a scope, or 0 if none claimed yet.
    pub async fn current(&self, scope: &SequenceScope) -> DbResult<i64> {
        let value: Option<i64> = sqlx::query_scalar(
            "SELECT last_value FROM document_counters WHERE kind = ?1 AND period = ?2",
        )
        .bind(scope.counter_kind)
        .bind(&scope.period)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_claim_is_monotonic() {
        let db = test_db().await;
        let repo = db.sequences();
        let scope = SequenceScope::item();

        assert_eq!(repo.claim(&scope).await.unwrap(), 1);
        assert_eq!(repo.claim(&scope).await.unwrap(), 2);
        assert_eq!(repo.claim(&scope).await.unwrap(), 3);
        assert_eq!(repo.current(&scope).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let db = test_db().await;
        let repo = db.sequences();

        let jan = SequenceScope::sale(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        let feb = SequenceScope::sale(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        assert_eq!(repo.claim(&jan).await.unwrap(), 1);
        assert_eq!(repo.claim(&jan).await.unwrap(), 2);
        // February restarts from 1
        assert_eq!(repo.claim(&feb).await.unwrap(), 1);

        // Purchases never share a counter with sales
        let purchase = SequenceScope::purchase(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(repo.claim(&purchase).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_current_before_any_claim() {
        let db = test_db().await;
        let repo = db.sequences();

        assert_eq!(repo.current(&SequenceScope::member()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_claimed_values_format_to_distinct_codes() {
        let db = test_db().await;
        let repo = db.sequences();
        let scope = SequenceScope::sale(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());

        let mut codes = Vec::new();
        for _ in 0..5 {
            let seq = repo.claim(&scope).await.unwrap();
            codes.push(scope.format(seq).unwrap());
        }

        assert_eq!(codes[0], "INV-S25010001");
        assert_eq!(codes[4], "INV-S25010005");

        let mut deduped = codes.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }
}
