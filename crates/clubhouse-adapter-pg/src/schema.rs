//! Table definitions and the idempotent bootstrap.

use sqlx::PgPool;

/// Creates the four tables if they are missing. Safe to run on every start.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id                SERIAL PRIMARY KEY,
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    phone             TEXT,
    email             TEXT,
    category          TEXT NOT NULL
                      CHECK (category IN ('members', 'athletes', 'students', 'interested')),
    status            TEXT NOT NULL DEFAULT 'active'
                      CHECK (status IN ('active', 'inactive')),
    year              INTEGER,
    month             SMALLINT CHECK (month BETWEEN 1 AND 12),
    subscription_year INTEGER,
    federation_number TEXT,
    university        BOOLEAN,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS people_category_idx ON people (category);
CREATE INDEX IF NOT EXISTS people_name_idx ON people (last_name, first_name);

CREATE TABLE IF NOT EXISTS custom_fields (
    id                    SERIAL PRIMARY KEY,
    key                   TEXT NOT NULL UNIQUE,
    label                 TEXT NOT NULL,
    applicable_categories TEXT[] NOT NULL,
    created_at            TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS member_attributes (
    id          SERIAL PRIMARY KEY,
    member_id   INTEGER NOT NULL REFERENCES people (id) ON DELETE CASCADE,
    field_id    INTEGER NOT NULL REFERENCES custom_fields (id) ON DELETE CASCADE,
    field_value TEXT NOT NULL,
    UNIQUE (member_id, field_id)
);

CREATE TABLE IF NOT EXISTS settings (
    id         INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    club_name  TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Constraint names Postgres generates for the attribute foreign keys.
pub(crate) const MEMBER_FK: &str = "member_attributes_member_id_fkey";
pub(crate) const FIELD_FK: &str = "member_attributes_field_id_fkey";

pub async fn bootstrap(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    tracing::info!("Database schema ready");
    Ok(())
}
