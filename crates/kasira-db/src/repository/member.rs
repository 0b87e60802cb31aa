//! # Member Repository
//!
//! CRUD for registered customers. Members are keyed by their generated
//! `MBR#####` business code.

use chrono::{DateTime, Utc};
use kasira_core::types::Member;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};

const SELECT_MEMBER: &str =
    "SELECT code, name, phone, address, created_at, updated_at FROM members";

/// Repository for the `members` table.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    pub async fn find(&self, code: &str) -> DbResult<Option<Member>> {
        Self::find_with(&self.pool, code).await
    }

    pub async fn find_with<'e, E>(executor: E, code: &str) -> DbResult<Option<Member>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let member = sqlx::query_as::<_, Member>(&format!("{SELECT_MEMBER} WHERE code = ?1"))
            .bind(code)
            .fetch_optional(executor)
            .await?;

        Ok(member)
    }

    pub async fn get(&self, code: &str) -> DbResult<Member> {
        self.find(code)
            .await?
            .ok_or_else(|| DbError::not_found("Member", code))
    }

    /// Lists members, optionally filtered by a name/code/phone substring.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Member>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_MEMBER);

        if let Some(search) = search {
            let pattern = format!("%{search}%");
            qb.push(" WHERE name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR code LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR phone LIKE ");
            qb.push_bind(pattern);
        }

        qb.push(" ORDER BY code");

        let members = qb.build_query_as::<Member>().fetch_all(&self.pool).await?;
        Ok(members)
    }

    pub async fn insert_with<'e, E>(executor: E, member: &Member) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO members (code, name, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&member.code)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update_with<'e, E>(
        executor: E,
        code: &str,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = ?2, phone = ?3, address = ?4, updated_at = ?5
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(phone)
        .bind(address)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a member row.
    ///
    /// Fails with a foreign-key violation while any sale still references
    /// the member.
    pub async fn delete_with<'e, E>(executor: E, code: &str) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM members WHERE code = ?1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
