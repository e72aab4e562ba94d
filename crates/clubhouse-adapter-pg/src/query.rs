//! SQL for member listings.
//!
//! The WHERE clause mirrors `MemberFilter::matches`: every set option adds
//! one conjunct, each custom field predicate becomes an `EXISTS` over
//! `member_attributes`.

use clubhouse_core::{AttributeCondition, ClubError, ClubResult, MemberFilter};
use sqlx::Arguments;
use sqlx::postgres::PgArguments;

pub(crate) const MEMBER_COLUMNS: &str = "p.id, p.first_name, p.last_name, p.phone, p.email, \
     p.category, p.status, p.year, p.month, p.subscription_year, p.federation_number, \
     p.university, p.created_at";

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Bind {
    Text(String),
    Int(i32),
}

pub(crate) fn args_add<T>(args: &mut PgArguments, v: T) -> ClubResult<()>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v)
        .map_err(|e| ClubError::Database(format!("failed to bind argument: {}", e)))
}

impl Bind {
    fn add_to(self, args: &mut PgArguments) -> ClubResult<()> {
        match self {
            Bind::Text(s) => args_add(args, s),
            Bind::Int(n) => args_add(args, n),
        }
    }
}

/// Build `WHERE ...` (or an empty string) and its binds, numbering
/// placeholders from `$1`.
pub(crate) fn where_clause(filter: &MemberFilter) -> (String, Vec<Bind>) {
    let mut parts: Vec<String> = Vec::new();
    let mut binds: Vec<Bind> = Vec::new();
    let mut idx: usize = 1;

    if let Some(category) = filter.category {
        parts.push(format!("p.category = ${}", idx));
        binds.push(Bind::Text(category.slug().to_string()));
        idx += 1;
    }
    if let Some(status) = filter.status {
        parts.push(format!("p.status = ${}", idx));
        binds.push(Bind::Text(status.slug().to_string()));
        idx += 1;
    }
    if let Some(from) = filter.year_from {
        parts.push(format!("p.year >= ${}", idx));
        binds.push(Bind::Int(from));
        idx += 1;
    }
    if let Some(to) = filter.year_to {
        parts.push(format!("p.year <= ${}", idx));
        binds.push(Bind::Int(to));
        idx += 1;
    }
    if let Some(name) = &filter.name_contains {
        parts.push(format!(
            "(strpos(lower(p.first_name), lower(${0})) > 0 OR strpos(lower(p.last_name), lower(${0})) > 0)",
            idx
        ));
        binds.push(Bind::Text(name.clone()));
        idx += 1;
    }
    if let Some(email) = &filter.email_contains {
        parts.push(format!("strpos(lower(p.email), lower(${})) > 0", idx));
        binds.push(Bind::Text(email.clone()));
        idx += 1;
    }
    for predicate in &filter.attributes {
        let field_idx = idx;
        binds.push(Bind::Int(predicate.field_id));
        idx += 1;
        let condition = match &predicate.condition {
            AttributeCondition::Equals(value) => {
                binds.push(Bind::Text(value.clone()));
                idx += 1;
                format!("lower(btrim(a.field_value)) = lower(btrim(${}))", idx - 1)
            }
            AttributeCondition::Contains(value) => {
                binds.push(Bind::Text(value.clone()));
                idx += 1;
                format!("strpos(lower(a.field_value), lower(${})) > 0", idx - 1)
            }
            AttributeCondition::IsSet => "btrim(a.field_value) <> ''".to_string(),
        };
        parts.push(format!(
            "EXISTS (SELECT 1 FROM member_attributes a WHERE a.member_id = p.id AND a.field_id = ${} AND {})",
            field_idx, condition
        ));
    }

    let sql = if parts.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", parts.join(" AND "))
    };
    (sql, binds)
}

/// The full listing query with its arguments.
pub(crate) fn list_members_query(filter: &MemberFilter) -> ClubResult<(String, PgArguments)> {
    let (where_sql, binds) = where_clause(filter);
    let mut args = PgArguments::default();
    for bind in binds {
        bind.add_to(&mut args)?;
    }
    let sql = format!(
        "SELECT {} FROM people AS p {} ORDER BY p.last_name, p.first_name, p.id",
        MEMBER_COLUMNS, where_sql
    );
    Ok((sql, args))
}
