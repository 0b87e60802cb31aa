//! # Supplier Repository
//!
//! CRUD for purchase counterparties. Suppliers carry no derived state, so
//! this is the simplest repository in the crate.

use chrono::{DateTime, Utc};
use kasira_core::types::Supplier;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};

const SELECT_SUPPLIER: &str =
    "SELECT id, name, contact, address, created_at, updated_at FROM suppliers";

/// Repository for the `suppliers` table.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn find(&self, id: &str) -> DbResult<Option<Supplier>> {
        Self::find_with(&self.pool, id).await
    }

    pub async fn find_with<'e, E>(executor: E, id: &str) -> DbResult<Option<Supplier>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(supplier)
    }

    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Lists all suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers =
            sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} ORDER BY name, id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(suppliers)
    }

    pub async fn insert_with<'e, E>(executor: E, supplier: &Supplier) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, contact, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update_with<'e, E>(
        executor: E,
        id: &str,
        name: &str,
        contact: Option<&str>,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?2, contact = ?3, address = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(contact)
        .bind(address)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a supplier row.
    ///
    /// Fails with a foreign-key violation while any purchase still
    /// references the supplier.
    pub async fn delete_with<'e, E>(executor: E, id: &str) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
