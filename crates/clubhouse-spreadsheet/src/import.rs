//! Row-by-row import of a mapped sheet.

use clubhouse_core::{
    Category, CategoryDetails, ClubError, ClubResult, MemberDraft, MemberStatus, Month,
};
use clubhouse_runtime::{CustomFieldEngine, MemberRepository, check_attributes};
use serde::Serialize;

use crate::columns::ScalarField;
use crate::mapping::{ImportMapping, ResolvedMapping};
use crate::workbook::SheetData;

/// Reason recorded for rows matching an existing member.
pub const DUPLICATE_MEMBER: &str = "duplicate member";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Data row number, 1 for the row below the header.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    fn skip(&mut self, row: usize, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(row, reason = %reason, "Import row skipped");
        self.skipped.push(SkippedRow { row, reason });
    }
}

/// Import every data row of `sheet`.
///
/// The mapping is validated first; an invalid mapping fails before anything
/// is written. Afterwards each row stands alone: parse failures, duplicates
/// and category mismatches skip the row and the batch continues. Only a
/// lost database connection aborts the import.
pub async fn import_sheet(
    members: &MemberRepository,
    fields: &CustomFieldEngine,
    sheet: &SheetData,
    mapping: &ImportMapping,
) -> ClubResult<ImportReport> {
    let catalogue = fields.list_fields().await?;
    let resolved = mapping.resolve(sheet, &catalogue)?;
    let mut report = ImportReport::default();

    for index in 0..sheet.rows.len() {
        let row = index + 1;
        if sheet.row_is_blank(index) {
            continue;
        }

        let draft = match draft_from_row(sheet, index, &resolved) {
            Ok(draft) => draft.normalized(),
            Err(reason) => {
                report.skip(row, reason);
                continue;
            }
        };
        if let Err(e) = check_attributes(&catalogue, draft.category(), &draft.attributes) {
            report.skip(row, e.to_string());
            continue;
        }
        match members
            .find_duplicate(&draft.first_name, &draft.last_name, draft.email.as_deref())
            .await
        {
            Ok(Some(_)) => {
                report.skip(row, DUPLICATE_MEMBER);
                continue;
            }
            Ok(None) => {}
            Err(e @ ClubError::Connection(_)) => return Err(e),
            Err(e) => {
                report.skip(row, e.to_string());
                continue;
            }
        }
        match members.create(draft).await {
            Ok(_) => report.inserted += 1,
            Err(e @ ClubError::Connection(_)) => return Err(e),
            Err(e) => report.skip(row, e.to_string()),
        }
    }

    tracing::info!(
        sheet = %sheet.name,
        inserted = report.inserted,
        skipped = report.skipped.len(),
        "Import finished"
    );
    Ok(report)
}

fn draft_from_row(
    sheet: &SheetData,
    index: usize,
    mapping: &ResolvedMapping,
) -> Result<MemberDraft, String> {
    let text = |field: ScalarField| {
        mapping
            .scalar
            .get(&field)
            .map(|col| sheet.cell(index, *col))
            .filter(|v| !v.is_empty())
    };

    let first_name = text(ScalarField::FirstName).ok_or("missing first name")?;
    let last_name = text(ScalarField::LastName).ok_or("missing last name")?;
    let category = match text(ScalarField::Category) {
        Some(value) => {
            Category::parse(value).ok_or_else(|| format!("unknown category '{}'", value))?
        }
        None => mapping
            .default_category
            .ok_or_else(|| "missing category".to_string())?,
    };
    let status = match text(ScalarField::Status) {
        Some(value) => {
            MemberStatus::parse(value).ok_or_else(|| format!("unknown status '{}'", value))?
        }
        None => MemberStatus::Active,
    };
    let year = text(ScalarField::Year)
        .map(|v| parse_year(v).ok_or_else(|| format!("invalid year '{}'", v)))
        .transpose()?;
    let month = text(ScalarField::Month)
        .map(|v| Month::parse(v).ok_or_else(|| format!("invalid month '{}'", v)))
        .transpose()?;
    let subscription_year = text(ScalarField::SubscriptionYear)
        .map(|v| parse_year(v).ok_or_else(|| format!("invalid subscription year '{}'", v)))
        .transpose()?;
    let university = text(ScalarField::University)
        .map(|v| parse_flag(v).ok_or_else(|| format!("invalid university value '{}'", v)))
        .transpose()?;

    let mut draft = MemberDraft::new(first_name, last_name, category);
    draft.phone = text(ScalarField::Phone).map(str::to_string);
    draft.email = text(ScalarField::Email).map(str::to_string);
    draft.status = status;
    draft.year = year;
    draft.details = CategoryDetails::from_columns(
        category,
        month,
        subscription_year,
        text(ScalarField::FederationNumber).map(str::to_string),
        university,
    );
    for (field_id, col) in &mapping.custom {
        let value = sheet.cell(index, *col);
        if !value.is_empty() {
            draft.attributes.insert(*field_id, value.to_string());
        }
    }
    Ok(draft)
}

fn parse_year(value: &str) -> Option<i32> {
    value
        .parse::<i32>()
        .ok()
        .or_else(|| match value.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 => Some(f as i32),
            _ => None,
        })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "ναι" | "x" => Some(true),
        "no" | "n" | "false" | "0" | "οχι" | "όχι" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_core::{FIELD_NOT_APPLICABLE, MemberFilter};
    use clubhouse_runtime::{InMemoryStore, SharedStore};
    use std::sync::Arc;

    fn services() -> (MemberRepository, CustomFieldEngine) {
        let store: SharedStore = Arc::new(InMemoryStore::new());
        (
            MemberRepository::new(store.clone()),
            CustomFieldEngine::new(store),
        )
    }

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> SheetData {
        SheetData {
            name: "Μέλη".into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_row_with_inapplicable_field_is_skipped() {
        let (members, fields) = services();
        let amka = fields
            .define_field("ΑΜΚΑ", [Category::Members, Category::Athletes].into())
            .await
            .unwrap();
        let data = sheet(
            &["First name", "Last name", "Category", "ΑΜΚΑ"],
            &[
                &["Maria", "Papa", "members", "111"],
                &["Petros", "Vlachos", "athletes", "222"],
                &["Anna", "Georgiou", "students", "333"],
                &["Eleni", "Markou", "interested", ""],
                &["Nikos", "Dimou", "ΜΕΛΟΣ", ""],
            ],
        );
        let mapping = ImportMapping::suggest(&data.headers, &fields.list_fields().await.unwrap());
        assert_eq!(mapping.custom.get(&amka.id).map(String::as_str), Some("ΑΜΚΑ"));

        let report = import_sheet(&members, &fields, &data, &mapping).await.unwrap();
        assert_eq!(report.inserted, 4);
        assert_eq!(
            report.skipped,
            vec![SkippedRow {
                row: 3,
                reason: FIELD_NOT_APPLICABLE.to_string()
            }]
        );
        let names: Vec<String> = members
            .list(MemberFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|m| m.first_name.clone())
            .collect();
        assert!(!names.contains(&"Anna".to_string()));
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn test_parse_failures_duplicates_and_blank_rows() {
        let (members, fields) = services();
        let data = sheet(
            &["Όνομα", "Επώνυμο", "Email", "Κατάσταση", "Έτος", "Μήνας"],
            &[
                &["Maria", "Papa", "maria@club.gr", "ΝΑΙ", "2019", "Μάρτιος"],
                &["", "", "", "", "", ""],
                &["", "Nameless", "", "", "", ""],
                &["Nikos", "Dimou", "", "maybe", "", ""],
                &["Kostas", "Lazos", "", "", "twenty", ""],
                &["MARIA", "papa", "Maria@Club.gr", "", "", ""],
                &["Zoe", "Alexiou", "", "ΟΧΙ", "2021.0", "13"],
            ],
        );
        let mut mapping = ImportMapping::suggest(&data.headers, &[]);
        mapping.default_category = Some(Category::Members);

        let report = import_sheet(&members, &fields, &data, &mapping).await.unwrap();
        assert_eq!(report.inserted, 1);
        let reasons: Vec<(usize, &str)> = report
            .skipped
            .iter()
            .map(|s| (s.row, s.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (3, "missing first name"),
                (4, "unknown status 'maybe'"),
                (5, "invalid year 'twenty'"),
                (6, DUPLICATE_MEMBER),
                (7, "invalid month '13'"),
            ]
        );

        let maria = &members.list(MemberFilter::default()).await.unwrap()[0];
        assert_eq!(maria.year, Some(2019));
        assert_eq!(maria.details.month(), Some(Month::March));
    }

    #[tokio::test]
    async fn test_invalid_mapping_writes_nothing() {
        let (members, fields) = services();
        let data = sheet(&["First name", "Last name"], &[&["A", "B"]]);
        let mapping = ImportMapping::suggest(&data.headers, &[]);
        let err = import_sheet(&members, &fields, &data, &mapping)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("map_category"));
        assert_eq!(members.category_counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_is_row_level() {
        let (members, fields) = services();
        let data = sheet(
            &["First name", "Last name", "Email"],
            &[&["A", "B", "not an email"], &["C", "D", "c@d.gr"]],
        );
        let mut mapping = ImportMapping::suggest(&data.headers, &[]);
        mapping.default_category = Some(Category::Interested);
        let report = import_sheet(&members, &fields, &data, &mapping).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, 1);
        assert!(report.skipped[0].reason.starts_with("email:"));
    }

    #[tokio::test]
    async fn test_lost_connection_aborts_import() {
        let catalogue_store = Arc::new(InMemoryStore::new());
        let member_store = Arc::new(InMemoryStore::new());
        let fields = CustomFieldEngine::new(catalogue_store);
        let members = MemberRepository::new(member_store.clone());
        let data = sheet(
            &["First name", "Last name"],
            &[&["Maria", "Papa"], &["Petros", "Vlachos"]],
        );
        let mut mapping = ImportMapping::suggest(&data.headers, &[]);
        mapping.default_category = Some(Category::Members);

        member_store.set_offline(true);
        let err = import_sheet(&members, &fields, &data, &mapping)
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::Connection(_)));

        member_store.set_offline(false);
        assert_eq!(members.category_counts().await.unwrap().total(), 0);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_year("2019"), Some(2019));
        assert_eq!(parse_year("2019.0"), Some(2019));
        assert_eq!(parse_year("2019.5"), None);
        assert_eq!(parse_flag("Ναι"), Some(true));
        assert_eq!(parse_flag("No"), Some(false));
        assert_eq!(parse_flag("perhaps"), None);
    }
}
