//! Parsing of submitted forms and query strings.
//!
//! Forms arrive as flat string maps. Custom field inputs are named
//! `cf_{id}`, category checkboxes `cat_{slug}` and import mapping selects
//! `map_{field}` / `map_cf_{id}`.

use clubhouse_core::{
    AttributeCondition, AttributePredicate, Category, CategoryDetails, ClubError, FieldId, Member,
    MemberDraft, MemberFilter, MemberStatus, Month,
};
use clubhouse_spreadsheet::{ImportMapping, ScalarField};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type FormData = HashMap<String, String>;

/// Trimmed value of `key`, empty when absent.
pub fn value<'a>(form: &'a FormData, key: &str) -> &'a str {
    form.get(key).map(|v| v.trim()).unwrap_or("")
}

fn optional(form: &FormData, key: &str) -> Option<String> {
    let v = value(form, key);
    (!v.is_empty()).then(|| v.to_string())
}

fn is_checked(form: &FormData, key: &str) -> bool {
    matches!(value(form, key), "on" | "true" | "1")
}

/// Error messages keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Place a validation error next to its input. Returns the error back
    /// for any other kind.
    pub fn absorb(&mut self, error: ClubError) -> Result<(), ClubError> {
        match error {
            ClubError::Validation { field, message } => {
                self.insert(field, message);
                Ok(())
            }
            other => Err(other),
        }
    }
}

fn parse_number(form: &FormData, key: &str, errors: &mut FieldErrors) -> Option<i32> {
    let raw = value(form, key);
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.insert(key, format!("'{}' is not a year", raw));
            None
        }
    }
}

/// Parse an optional choice, reporting a value `parse` does not know.
fn parse_choice<T>(
    form: &FormData,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = value(form, key);
    if raw.is_empty() {
        return None;
    }
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.insert(key, format!("unknown {} '{}'", key, raw));
    }
    parsed
}

/// Custom field inputs (`cf_{id}`) with their raw values.
pub fn custom_values(form: &FormData) -> BTreeMap<FieldId, String> {
    form.iter()
        .filter_map(|(k, v)| {
            let id = k.strip_prefix("cf_")?.parse::<FieldId>().ok()?;
            Some((id, v.trim().to_string()))
        })
        .collect()
}

/// Build a member draft from the add/edit form.
pub fn parse_member_form(form: &FormData) -> Result<MemberDraft, FieldErrors> {
    let mut errors = FieldErrors::default();

    let category = match value(form, "category") {
        "" => {
            errors.insert("category", "choose a category");
            None
        }
        raw => {
            let parsed = Category::parse(raw);
            if parsed.is_none() {
                errors.insert("category", format!("unknown category '{}'", raw));
            }
            parsed
        }
    };
    let status = match value(form, "status") {
        "" => MemberStatus::Active,
        raw => MemberStatus::parse(raw).unwrap_or_else(|| {
            errors.insert("status", format!("unknown status '{}'", raw));
            MemberStatus::Active
        }),
    };
    let year = parse_number(form, "year", &mut errors);
    let subscription_year = parse_number(form, "subscription_year", &mut errors);
    let month = match value(form, "month") {
        "" => None,
        raw => {
            let parsed = Month::parse(raw);
            if parsed.is_none() {
                errors.insert("month", format!("unknown month '{}'", raw));
            }
            parsed
        }
    };

    let Some(category) = category else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut draft = MemberDraft::new(value(form, "first_name"), value(form, "last_name"), category);
    draft.phone = optional(form, "phone");
    draft.email = optional(form, "email");
    draft.status = status;
    draft.year = year;
    draft.details = CategoryDetails::from_columns(
        category,
        month,
        subscription_year,
        optional(form, "federation_number"),
        Some(is_checked(form, "university")),
    );
    draft.attributes = custom_values(form);
    Ok(draft)
}

/// Form values that reproduce a stored member in the edit form.
pub fn member_form_data(member: &Member) -> FormData {
    let mut form = FormData::new();
    form.insert("first_name".into(), member.first_name.clone());
    form.insert("last_name".into(), member.last_name.clone());
    if let Some(phone) = &member.phone {
        form.insert("phone".into(), phone.clone());
    }
    if let Some(email) = &member.email {
        form.insert("email".into(), email.clone());
    }
    form.insert("status".into(), member.status.slug().into());
    form.insert("category".into(), member.category().slug().into());
    if let Some(year) = member.year {
        form.insert("year".into(), year.to_string());
    }
    if let Some(month) = member.details.month() {
        form.insert("month".into(), month.number().to_string());
    }
    if let Some(year) = member.details.subscription_year() {
        form.insert("subscription_year".into(), year.to_string());
    }
    if let Some(number) = member.details.federation_number() {
        form.insert("federation_number".into(), number.to_string());
    }
    if member.details.university() == Some(true) {
        form.insert("university".into(), "on".into());
    }
    for (id, v) in &member.attributes {
        form.insert(format!("cf_{}", id), v.clone());
    }
    form
}

/// Keys understood by [`parse_filter`] other than `cf_*` / `cfset_*`.
const FILTER_KEYS: [&str; 6] = ["category", "status", "year_from", "year_to", "q", "email"];

/// Read list filters from a query string. Unparsable options are reported
/// and left unset.
pub fn parse_filter(query: &FormData) -> (MemberFilter, FieldErrors) {
    let mut errors = FieldErrors::default();
    let mut filter = MemberFilter {
        category: parse_choice(query, "category", Category::parse, &mut errors),
        status: parse_choice(query, "status", MemberStatus::parse, &mut errors),
        year_from: parse_number(query, "year_from", &mut errors),
        year_to: parse_number(query, "year_to", &mut errors),
        name_contains: optional(query, "q"),
        email_contains: optional(query, "email"),
        attributes: Vec::new(),
    };

    let mut predicates: BTreeMap<FieldId, AttributeCondition> = BTreeMap::new();
    for (key, raw) in query {
        if let Some(id) = key.strip_prefix("cfset_").and_then(|s| s.parse::<FieldId>().ok())
            && is_checked(query, key)
        {
            predicates.insert(id, AttributeCondition::IsSet);
        } else if let Some(id) = key.strip_prefix("cf_").and_then(|s| s.parse::<FieldId>().ok())
            && !raw.trim().is_empty()
        {
            predicates
                .entry(id)
                .or_insert_with(|| AttributeCondition::Contains(raw.trim().to_string()));
        }
    }
    filter.attributes = predicates
        .into_iter()
        .map(|(id, condition)| AttributePredicate::new(id, condition))
        .collect();
    (filter.normalized(), errors)
}

/// The filter part of `query` re-encoded, for export and tab links.
pub fn filter_query_string(query: &FormData, skip: &[&str]) -> String {
    let mut pairs: Vec<(&str, &str)> = query
        .iter()
        .filter(|(k, v)| {
            let known = FILTER_KEYS.contains(&k.as_str())
                || k.starts_with("cf_")
                || k.starts_with("cfset_");
            known && !skip.contains(&k.as_str()) && !v.trim().is_empty()
        })
        .map(|(k, v)| (k.as_str(), v.trim()))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Categories ticked as `cat_{slug}` checkboxes.
pub fn parse_categories(form: &FormData) -> BTreeSet<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| is_checked(form, &format!("cat_{}", c.slug())))
        .collect()
}

/// Read the import mapping form. Blank selects leave a field unmapped.
pub fn parse_mapping_form(form: &FormData) -> ImportMapping {
    let mut mapping = ImportMapping {
        default_category: Category::parse(value(form, "default_category")),
        ..Default::default()
    };
    for (key, raw) in form {
        let header = raw.trim();
        if header.is_empty() {
            continue;
        }
        if let Some(id) = key.strip_prefix("map_cf_").and_then(|s| s.parse::<FieldId>().ok()) {
            mapping.custom.insert(id, header.to_string());
        } else if let Some(field) = key.strip_prefix("map_").and_then(ScalarField::from_key) {
            mapping.scalar.insert(field, header.to_string());
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_member_form() {
        let draft = parse_member_form(&form(&[
            ("first_name", " Maria "),
            ("last_name", "Papadopoulou"),
            ("email", ""),
            ("category", "students"),
            ("status", "inactive"),
            ("year", "2021"),
            ("month", "10"),
            ("university", "on"),
            ("cf_3", "Υπότροφος"),
            ("cf_x", "ignored"),
        ]))
        .unwrap();
        assert_eq!(draft.first_name, "Maria");
        assert_eq!(draft.email, None);
        assert_eq!(draft.status, MemberStatus::Inactive);
        assert_eq!(draft.year, Some(2021));
        assert_eq!(
            draft.details,
            CategoryDetails::Students {
                period_month: Some(Month::October),
                university: true,
            }
        );
        assert_eq!(draft.attributes, BTreeMap::from([(3, "Υπότροφος".to_string())]));
    }

    #[test]
    fn test_parse_member_form_collects_errors() {
        let errors = parse_member_form(&form(&[
            ("first_name", "Maria"),
            ("category", "members"),
            ("year", "abc"),
            ("month", "13"),
        ]))
        .unwrap_err();
        assert_eq!(errors.get("year"), Some("'abc' is not a year"));
        assert_eq!(errors.get("month"), Some("unknown month '13'"));

        let errors = parse_member_form(&form(&[("first_name", "Maria")])).unwrap_err();
        assert_eq!(errors.get("category"), Some("choose a category"));
    }

    #[test]
    fn test_member_form_data_round_trips() {
        let draft = parse_member_form(&form(&[
            ("first_name", "Petros"),
            ("last_name", "Vlachos"),
            ("category", "athletes"),
            ("federation_number", "012034"),
            ("cf_1", "x"),
        ]))
        .unwrap();
        let member = Member {
            id: 4,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            phone: None,
            email: None,
            status: draft.status,
            year: None,
            details: draft.details.clone(),
            attributes: draft.attributes.clone(),
            created_at: chrono::Utc::now(),
        };
        let again = parse_member_form(&member_form_data(&member)).unwrap();
        assert_eq!(again, draft);
    }

    #[test]
    fn test_absorb_validation_only() {
        let mut errors = FieldErrors::default();
        assert!(
            errors
                .absorb(ClubError::validation("email", "bad"))
                .is_ok()
        );
        assert_eq!(errors.get("email"), Some("bad"));
        assert!(errors.absorb(ClubError::not_applicable()).is_err());
    }

    #[test]
    fn test_parse_filter() {
        let (filter, errors) = parse_filter(&form(&[
            ("category", "athletes"),
            ("status", "active"),
            ("year_from", "2019"),
            ("year_to", "soon"),
            ("q", "  "),
            ("cf_2", "XL"),
            ("cfset_5", "on"),
            ("notice", "created"),
        ]));
        assert_eq!(filter.category, Some(Category::Athletes));
        assert_eq!(filter.status, Some(MemberStatus::Active));
        assert_eq!(filter.year_from, Some(2019));
        assert_eq!(filter.year_to, None);
        assert_eq!(filter.name_contains, None);
        assert_eq!(
            filter.attributes,
            vec![
                AttributePredicate::new(2, AttributeCondition::Contains("XL".into())),
                AttributePredicate::new(5, AttributeCondition::IsSet),
            ]
        );
        assert!(errors.get("year_to").is_some());
    }

    #[test]
    fn test_parse_filter_reports_unknown_choices() {
        let (filter, errors) = parse_filter(&form(&[
            ("category", "coaches"),
            ("status", "activ"),
            ("year_from", "2019"),
        ]));
        assert_eq!(filter.category, None);
        assert_eq!(filter.status, None);
        assert_eq!(filter.year_from, Some(2019));
        assert_eq!(errors.get("category"), Some("unknown category 'coaches'"));
        assert_eq!(errors.get("status"), Some("unknown status 'activ'"));
    }

    #[test]
    fn test_filter_query_string() {
        let query = form(&[
            ("status", "active"),
            ("q", "Παπα"),
            ("notice", "created"),
            ("category", "members"),
            ("email", ""),
        ]);
        assert_eq!(
            filter_query_string(&query, &[]),
            "category=members&q=%CE%A0%CE%B1%CF%80%CE%B1&status=active"
        );
        assert_eq!(
            filter_query_string(&query, &["category"]),
            "q=%CE%A0%CE%B1%CF%80%CE%B1&status=active"
        );
    }

    #[test]
    fn test_parse_categories_and_mapping() {
        let cats = parse_categories(&form(&[("cat_members", "on"), ("cat_students", "on")]));
        assert_eq!(cats, BTreeSet::from([Category::Members, Category::Students]));

        let mapping = parse_mapping_form(&form(&[
            ("map_first_name", "Όνομα"),
            ("map_last_name", "Επώνυμο"),
            ("map_phone", ""),
            ("map_cf_3", "ΑΜΚΑ"),
            ("default_category", "members"),
            ("sheet", "Μέλη"),
        ]));
        assert_eq!(mapping.column_for(ScalarField::FirstName), Some("Όνομα"));
        assert_eq!(mapping.column_for(ScalarField::Phone), None);
        assert_eq!(mapping.custom[&3], "ΑΜΚΑ");
        assert_eq!(mapping.default_category, Some(Category::Members));
    }
}
