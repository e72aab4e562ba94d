//! PostgreSQL implementation of [`ClubStore`].
//!
//! The pool is opened once at startup, passed around inside the store and
//! closed explicitly with [`PostgresStore::close`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clubhouse_core::{
    Category, CategoryCounts, CategoryDetails, ClubError, ClubResult, CustomField, FieldId,
    Member, MemberDraft, MemberFilter, MemberId, MemberStatus, Month, NewCustomField,
    UpstreamConfig,
};
use clubhouse_runtime::ClubStore;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

mod query;
pub mod schema;

use query::MEMBER_COLUMNS;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone, Copy)]
pub struct PostgresStoreOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PostgresStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&UpstreamConfig> for PostgresStoreOptions {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_seconds),
        }
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open the connection pool.
    pub async fn connect(database_url: &str, options: PostgresStoreOptions) -> ClubResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(db_err)?;
        tracing::info!(
            max_connections = options.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create missing tables.
    pub async fn bootstrap(&self) -> ClubResult<()> {
        schema::bootstrap(&self.pool).await.map_err(db_err)
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }

    async fn load_attributes(
        &self,
        member_ids: &[MemberId],
    ) -> ClubResult<BTreeMap<MemberId, BTreeMap<FieldId, String>>> {
        let mut out: BTreeMap<MemberId, BTreeMap<FieldId, String>> = BTreeMap::new();
        if member_ids.is_empty() {
            return Ok(out);
        }
        let rows = sqlx::query(
            "SELECT member_id, field_id, field_value FROM member_attributes \
             WHERE member_id = ANY($1)",
        )
        .bind(member_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        for row in rows {
            let member_id: i32 = row.try_get("member_id").map_err(db_err)?;
            let field_id: i32 = row.try_get("field_id").map_err(db_err)?;
            let value: String = row.try_get("field_value").map_err(db_err)?;
            out.entry(member_id).or_default().insert(field_id, value);
        }
        Ok(out)
    }

    async fn members_from_rows(&self, rows: Vec<PgRow>) -> ClubResult<Vec<Member>> {
        let mut members = rows
            .iter()
            .map(member_from_row)
            .collect::<ClubResult<Vec<_>>>()?;
        let ids: Vec<MemberId> = members.iter().map(|m| m.id).collect();
        let mut attributes = self.load_attributes(&ids).await?;
        for member in &mut members {
            member.attributes = attributes.remove(&member.id).unwrap_or_default();
        }
        Ok(members)
    }
}

/// Map a driver error onto the shared taxonomy.
pub fn db_err(e: sqlx::Error) -> ClubError {
    match &e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => ClubError::Connection(e.to_string()),
        _ => ClubError::Database(e.to_string()),
    }
}

fn violated_constraint(e: &sqlx::Error, code: &str) -> Option<String> {
    let db = e.as_database_error()?;
    if db.code().as_deref() != Some(code) {
        return None;
    }
    Some(db.constraint().unwrap_or_default().to_string())
}

/// Foreign key failures on `member_attributes` mean a stale id.
fn attribute_err(e: sqlx::Error, member_id: Option<MemberId>, field_id: FieldId) -> ClubError {
    match violated_constraint(&e, FOREIGN_KEY_VIOLATION).as_deref() {
        Some(schema::FIELD_FK) => ClubError::field_not_found(field_id),
        Some(schema::MEMBER_FK) => match member_id {
            Some(id) => ClubError::member_not_found(id),
            None => db_err(e),
        },
        _ => db_err(e),
    }
}

fn corrupt(column: &str, value: impl std::fmt::Display) -> ClubError {
    ClubError::Database(format!("unexpected {} value '{}' in database", column, value))
}

fn member_from_row(row: &PgRow) -> ClubResult<Member> {
    let category: String = row.try_get("category").map_err(db_err)?;
    let category = Category::parse(&category).ok_or_else(|| corrupt("category", &category))?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let status = MemberStatus::parse(&status).ok_or_else(|| corrupt("status", &status))?;
    let month: Option<i16> = row.try_get("month").map_err(db_err)?;
    let month = match month {
        Some(n) => Some(
            u32::try_from(n)
                .ok()
                .and_then(Month::from_number)
                .ok_or_else(|| corrupt("month", n))?,
        ),
        None => None,
    };
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(db_err)?;

    Ok(Member {
        id: row.try_get("id").map_err(db_err)?,
        first_name: row.try_get("first_name").map_err(db_err)?,
        last_name: row.try_get("last_name").map_err(db_err)?,
        phone: row.try_get("phone").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        status,
        year: row.try_get("year").map_err(db_err)?,
        details: CategoryDetails::from_columns(
            category,
            month,
            row.try_get("subscription_year").map_err(db_err)?,
            row.try_get("federation_number").map_err(db_err)?,
            row.try_get("university").map_err(db_err)?,
        ),
        attributes: BTreeMap::new(),
        created_at,
    })
}

fn field_from_row(row: &PgRow) -> ClubResult<CustomField> {
    let slugs: Vec<String> = row.try_get("applicable_categories").map_err(db_err)?;
    let categories = slugs
        .iter()
        .map(|s| Category::parse(s).ok_or_else(|| corrupt("applicable_categories", s)))
        .collect::<ClubResult<BTreeSet<_>>>()?;
    Ok(CustomField {
        id: row.try_get("id").map_err(db_err)?,
        key: row.try_get("key").map_err(db_err)?,
        label: row.try_get("label").map_err(db_err)?,
        categories,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn month_column(draft: &MemberDraft) -> Option<i16> {
    draft.details.month().map(|m| m.number() as i16)
}

async fn upsert_attribute(
    tx: &mut Transaction<'_, Postgres>,
    member_id: MemberId,
    field_id: FieldId,
    value: &str,
) -> ClubResult<()> {
    sqlx::query(
        "INSERT INTO member_attributes (member_id, field_id, field_value) VALUES ($1, $2, $3) \
         ON CONFLICT (member_id, field_id) DO UPDATE SET field_value = EXCLUDED.field_value",
    )
    .bind(member_id)
    .bind(field_id)
    .bind(value)
    .execute(&mut **tx)
    .await
    .map_err(|e| attribute_err(e, Some(member_id), field_id))?;
    Ok(())
}

#[async_trait]
impl ClubStore for PostgresStore {
    async fn insert_member(&self, draft: &MemberDraft) -> ClubResult<Member> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query(
            "INSERT INTO people (first_name, last_name, phone, email, category, status, year, \
             month, subscription_year, federation_number, university) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(draft.category().slug())
        .bind(draft.status.slug())
        .bind(draft.year)
        .bind(month_column(draft))
        .bind(draft.details.subscription_year())
        .bind(draft.details.federation_number())
        .bind(draft.details.university())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        let id: MemberId = row.try_get("id").map_err(db_err)?;

        for (field_id, value) in &draft.attributes {
            if value.trim().is_empty() {
                continue;
            }
            upsert_attribute(&mut tx, id, *field_id, value).await?;
        }
        tx.commit().await.map_err(db_err)?;
        tracing::debug!(member_id = id, "INSERT people");

        self.get_member(id)
            .await?
            .ok_or_else(|| ClubError::member_not_found(id))
    }

    async fn update_member(&self, id: MemberId, draft: &MemberDraft) -> ClubResult<Member> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE people SET first_name = $2, last_name = $3, phone = $4, email = $5, \
             category = $6, status = $7, year = $8, month = $9, subscription_year = $10, \
             federation_number = $11, university = $12 WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(draft.category().slug())
        .bind(draft.status.slug())
        .bind(draft.year)
        .bind(month_column(draft))
        .bind(draft.details.subscription_year())
        .bind(draft.details.federation_number())
        .bind(draft.details.university())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        if updated.is_none() {
            return Err(ClubError::member_not_found(id));
        }

        for (field_id, value) in &draft.attributes {
            if value.trim().is_empty() {
                sqlx::query("DELETE FROM member_attributes WHERE member_id = $1 AND field_id = $2")
                    .bind(id)
                    .bind(*field_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            } else {
                upsert_attribute(&mut tx, id, *field_id, value).await?;
            }
        }

        let dropped = sqlx::query(
            "DELETE FROM member_attributes AS a USING custom_fields AS f \
             WHERE a.field_id = f.id AND a.member_id = $1 \
             AND NOT ($2 = ANY (f.applicable_categories))",
        )
        .bind(id)
        .bind(draft.category().slug())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();
        tx.commit().await.map_err(db_err)?;
        tracing::debug!(member_id = id, dropped_attributes = dropped, "UPDATE people");

        self.get_member(id)
            .await?
            .ok_or_else(|| ClubError::member_not_found(id))
    }

    async fn delete_member(&self, id: MemberId) -> ClubResult<()> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(ClubError::member_not_found(id));
        }
        Ok(())
    }

    async fn get_member(&self, id: MemberId) -> ClubResult<Option<Member>> {
        let sql = format!("SELECT {} FROM people AS p WHERE p.id = $1", MEMBER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(row) => Ok(self.members_from_rows(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_members(&self, filter: &MemberFilter) -> ClubResult<Vec<Member>> {
        let (sql, args) = query::list_members_query(filter)?;
        let rows = sqlx::query_with(&sql, args)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        tracing::debug!(rows = rows.len(), "SELECT people");
        self.members_from_rows(rows).await
    }

    async fn category_counts(&self) -> ClubResult<CategoryCounts> {
        let rows = sqlx::query("SELECT category, count(*)::bigint AS n FROM people GROUP BY category")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let mut counts = CategoryCounts::default();
        for row in rows {
            let slug: String = row.try_get("category").map_err(db_err)?;
            let n: i64 = row.try_get("n").map_err(db_err)?;
            let category = Category::parse(&slug).ok_or_else(|| corrupt("category", &slug))?;
            counts.add(category, n);
        }
        Ok(counts)
    }

    async fn find_member(
        &self,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
    ) -> ClubResult<Option<Member>> {
        let sql = format!(
            "SELECT {} FROM people AS p \
             WHERE lower(btrim(p.first_name)) = lower(btrim($1)) \
             AND lower(btrim(p.last_name)) = lower(btrim($2)) \
             AND (($3::text IS NULL AND p.email IS NULL) \
                  OR lower(btrim(p.email)) = lower(btrim($3::text))) \
             ORDER BY p.id LIMIT 1",
            MEMBER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(row) => Ok(self.members_from_rows(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn set_attribute(
        &self,
        member_id: MemberId,
        field_id: FieldId,
        value: Option<&str>,
    ) -> ClubResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        match value {
            Some(value) => upsert_attribute(&mut tx, member_id, field_id, value).await?,
            None => {
                sqlx::query("DELETE FROM member_attributes WHERE member_id = $1 AND field_id = $2")
                    .bind(member_id)
                    .bind(field_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
        }
        tx.commit().await.map_err(db_err)
    }

    async fn insert_field(&self, field: &NewCustomField) -> ClubResult<CustomField> {
        let slugs: Vec<String> = field
            .categories
            .iter()
            .map(|c| c.slug().to_string())
            .collect();
        let row = sqlx::query(
            "INSERT INTO custom_fields (key, label, applicable_categories) VALUES ($1, $2, $3) \
             RETURNING id, key, label, applicable_categories, created_at",
        )
        .bind(&field.key)
        .bind(&field.label)
        .bind(slugs)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e, UNIQUE_VIOLATION).is_some() {
                ClubError::validation(
                    "label",
                    format!("a field named '{}' already exists", field.label),
                )
            } else {
                db_err(e)
            }
        })?;
        field_from_row(&row)
    }

    async fn delete_field(&self, id: FieldId) -> ClubResult<()> {
        let result = sqlx::query("DELETE FROM custom_fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(ClubError::field_not_found(id));
        }
        Ok(())
    }

    async fn list_fields(&self) -> ClubResult<Vec<CustomField>> {
        let rows = sqlx::query(
            "SELECT id, key, label, applicable_categories, created_at FROM custom_fields ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(field_from_row).collect()
    }

    async fn get_field(&self, id: FieldId) -> ClubResult<Option<CustomField>> {
        let row = sqlx::query(
            "SELECT id, key, label, applicable_categories, created_at FROM custom_fields WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(field_from_row).transpose()
    }

    async fn club_name(&self) -> ClubResult<Option<String>> {
        let row = sqlx::query("SELECT club_name FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.try_get("club_name").map_err(db_err))
            .transpose()
    }

    async fn set_club_name(&self, name: &str) -> ClubResult<()> {
        sqlx::query(
            "INSERT INTO settings (id, club_name, updated_at) VALUES (1, $1, now()) \
             ON CONFLICT (id) DO UPDATE SET club_name = EXCLUDED.club_name, updated_at = now()",
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn ping(&self) -> ClubResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_errors() {
        assert_eq!(db_err(sqlx::Error::PoolTimedOut).kind(), "connection");
        assert_eq!(db_err(sqlx::Error::PoolClosed).kind(), "connection");
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(db_err(sqlx::Error::Io(io)).kind(), "connection");
    }

    #[test]
    fn test_other_errors_are_database_errors() {
        assert_eq!(db_err(sqlx::Error::RowNotFound).kind(), "database");
        assert_eq!(
            db_err(sqlx::Error::ColumnNotFound("month".into())).kind(),
            "database"
        );
    }

    #[test]
    fn test_options_from_config() {
        let config = UpstreamConfig {
            max_connections: 3,
            acquire_timeout_seconds: 2,
            ..Default::default()
        };
        let options = PostgresStoreOptions::from(&config);
        assert_eq!(options.max_connections, 3);
        assert_eq!(options.acquire_timeout, Duration::from_secs(2));
    }
}
