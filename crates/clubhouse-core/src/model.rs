//! Member, category and custom field types.
//!
//! A member belongs to exactly one [`Category`]. The category decides two
//! things: which fixed scalar columns the record carries (see
//! [`CategoryDetails`]) and which custom fields may hold values for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClubError, ClubResult};

/// Primary key of the `people` table.
pub type MemberId = i32;

/// Primary key of the `custom_fields` table.
pub type FieldId = i32;

/// Earliest year accepted for year columns.
pub const MIN_YEAR: i32 = 1900;
/// Latest year accepted for year columns.
pub const MAX_YEAR: i32 = 2100;

// =============================================================================
// Category
// =============================================================================

/// The four member classifications of the club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Members,
    Athletes,
    Students,
    Interested,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::Members,
        Category::Athletes,
        Category::Students,
        Category::Interested,
    ];

    /// Stable identifier used in URLs and in the database.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Members => "members",
            Category::Athletes => "athletes",
            Category::Students => "students",
            Category::Interested => "interested",
        }
    }

    /// English display label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Members => "Members",
            Category::Athletes => "Athletes",
            Category::Students => "Students",
            Category::Interested => "Interested",
        }
    }

    /// Greek label used by the club's existing spreadsheets.
    pub fn greek_label(self) -> &'static str {
        match self {
            Category::Members => "ΜΕΛΟΣ",
            Category::Athletes => "ΑΘΛΗΤΗΣ",
            Category::Students => "ΜΑΘΗΤΗΣ",
            Category::Interested => "ΕΝΔΙΑΦΕΡΟΜΕΝΟΣ",
        }
    }

    /// Parse a slug, English label or Greek label, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|c| {
            needle == c.slug()
                || needle == c.label().to_lowercase()
                || needle == c.greek_label().to_lowercase()
                || needle == c.singular()
        })
    }

    fn singular(self) -> &'static str {
        match self {
            Category::Members => "member",
            Category::Athletes => "athlete",
            Category::Students => "student",
            Category::Interested => "interested",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ClubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s)
            .ok_or_else(|| ClubError::validation("category", format!("unknown category '{}'", s.trim())))
    }
}

// =============================================================================
// Status
// =============================================================================

/// Whether the person is currently active in their category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 2] = [MemberStatus::Active, MemberStatus::Inactive];

    pub fn slug(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MemberStatus::Active => "Active",
            MemberStatus::Inactive => "Inactive",
        }
    }

    /// Accepts `active/inactive`, `yes/no`, `true/false` and `ΝΑΙ/ΟΧΙ`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "active" | "yes" | "y" | "true" | "1" | "ναι" => Some(MemberStatus::Active),
            "inactive" | "no" | "n" | "false" | "0" | "οχι" | "όχι" => {
                Some(MemberStatus::Inactive)
            }
            _ => None,
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MemberStatus {
    type Err = ClubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemberStatus::parse(s)
            .ok_or_else(|| ClubError::validation("status", format!("unknown status '{}'", s.trim())))
    }
}

// =============================================================================
// Month
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const GREEK_MONTHS: [&str; 12] = [
    "Ιανουάριος",
    "Φεβρουάριος",
    "Μάρτιος",
    "Απρίλιος",
    "Μάιος",
    "Ιούνιος",
    "Ιούλιος",
    "Αύγουστος",
    "Σεπτέμβριος",
    "Οκτώβριος",
    "Νοέμβριος",
    "Δεκέμβριος",
];

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Calendar number, 1 for January.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Self> {
        n.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn greek_label(self) -> &'static str {
        GREEK_MONTHS[self as usize]
    }

    /// Accepts English names (full or three letters), Greek names and 1..12.
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Ok(n) = needle.parse::<u32>() {
            return Self::from_number(n);
        }
        Self::ALL.into_iter().find(|m| {
            let english = m.label().to_lowercase();
            needle == english
                || (needle.chars().count() == 3 && english.starts_with(&needle))
                || needle == m.greek_label().to_lowercase()
        })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Per-category details
// =============================================================================

/// The fixed scalar schema of each category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum CategoryDetails {
    Members {
        joined_month: Option<Month>,
        subscription_year: Option<i32>,
    },
    Athletes {
        /// Federation registration number (ΑΜ ΕΟΜ).
        federation_number: Option<String>,
    },
    Students {
        period_month: Option<Month>,
        university: bool,
    },
    Interested {
        since_month: Option<Month>,
    },
}

impl CategoryDetails {
    /// Details with every optional column unset.
    pub fn empty(category: Category) -> Self {
        Self::from_columns(category, None, None, None, None)
    }

    /// Rebuild details from the flattened storage columns. Columns that do
    /// not belong to `category` are ignored.
    pub fn from_columns(
        category: Category,
        month: Option<Month>,
        subscription_year: Option<i32>,
        federation_number: Option<String>,
        university: Option<bool>,
    ) -> Self {
        match category {
            Category::Members => CategoryDetails::Members {
                joined_month: month,
                subscription_year,
            },
            Category::Athletes => CategoryDetails::Athletes { federation_number },
            Category::Students => CategoryDetails::Students {
                period_month: month,
                university: university.unwrap_or(false),
            },
            Category::Interested => CategoryDetails::Interested { since_month: month },
        }
    }

    pub fn category(&self) -> Category {
        match self {
            CategoryDetails::Members { .. } => Category::Members,
            CategoryDetails::Athletes { .. } => Category::Athletes,
            CategoryDetails::Students { .. } => Category::Students,
            CategoryDetails::Interested { .. } => Category::Interested,
        }
    }

    /// Joined, period or since month, depending on the category.
    pub fn month(&self) -> Option<Month> {
        match self {
            CategoryDetails::Members { joined_month, .. } => *joined_month,
            CategoryDetails::Students { period_month, .. } => *period_month,
            CategoryDetails::Interested { since_month } => *since_month,
            CategoryDetails::Athletes { .. } => None,
        }
    }

    pub fn subscription_year(&self) -> Option<i32> {
        match self {
            CategoryDetails::Members {
                subscription_year, ..
            } => *subscription_year,
            _ => None,
        }
    }

    pub fn federation_number(&self) -> Option<&str> {
        match self {
            CategoryDetails::Athletes { federation_number } => federation_number.as_deref(),
            _ => None,
        }
    }

    /// `None` for categories without a university column.
    pub fn university(&self) -> Option<bool> {
        match self {
            CategoryDetails::Students { university, .. } => Some(*university),
            _ => None,
        }
    }

    fn normalized(self) -> Self {
        match self {
            CategoryDetails::Athletes { federation_number } => CategoryDetails::Athletes {
                federation_number: non_empty(federation_number),
            },
            other => other,
        }
    }
}

// =============================================================================
// Members
// =============================================================================

/// A stored member joined with its custom attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: MemberStatus,
    /// Year the person entered their category.
    pub year: Option<i32>,
    pub details: CategoryDetails,
    pub attributes: BTreeMap<FieldId, String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn attribute(&self, field_id: FieldId) -> Option<&str> {
        self.attributes.get(&field_id).map(String::as_str)
    }
}

/// Member content to be written: the full scalar state plus attribute
/// values.
///
/// On create, `attributes` holds the initial values and empty values are
/// skipped. On update, it holds only the values being changed and an empty
/// value clears the attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: MemberStatus,
    pub year: Option<i32>,
    pub details: CategoryDetails,
    #[serde(default)]
    pub attributes: BTreeMap<FieldId, String>,
}

impl MemberDraft {
    /// A draft with names and category set, everything else empty.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            email: None,
            status: MemberStatus::Active,
            year: None,
            details: CategoryDetails::empty(category),
            attributes: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// Trim text inputs and turn blank optional values into `None`.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            status: self.status,
            year: self.year,
            details: self.details.normalized(),
            attributes: self
                .attributes
                .into_iter()
                .map(|(id, v)| (id, v.trim().to_string()))
                .collect(),
        }
    }

    /// Presence and basic format checks on the scalar columns.
    pub fn validate(&self) -> ClubResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(ClubError::validation("first_name", "first name is required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ClubError::validation("last_name", "last name is required"));
        }
        if let Some(email) = self.email.as_deref().map(str::trim)
            && !email.is_empty()
            && (!email.contains('@') || email.contains(char::is_whitespace))
        {
            return Err(ClubError::validation(
                "email",
                format!("'{}' is not an email address", email),
            ));
        }
        check_year("year", self.year)?;
        check_year("subscription_year", self.details.subscription_year())?;
        Ok(())
    }
}

fn check_year(field: &str, year: Option<i32>) -> ClubResult<()> {
    match year {
        Some(y) if !(MIN_YEAR..=MAX_YEAR).contains(&y) => Err(ClubError::validation(
            field,
            format!("year must be between {} and {}", MIN_YEAR, MAX_YEAR),
        )),
        _ => Ok(()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Partial update of a member. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub status: Option<MemberStatus>,
    pub year: Option<Option<i32>>,
    /// New category details; switching variant changes the category.
    pub details: Option<CategoryDetails>,
    /// Attribute values to set; an empty value clears the attribute.
    #[serde(default)]
    pub attributes: BTreeMap<FieldId, String>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        *self == MemberPatch::default()
    }

    /// Merge the patch over a stored member.
    pub fn apply_to(&self, member: &Member) -> MemberDraft {
        MemberDraft {
            first_name: self
                .first_name
                .clone()
                .unwrap_or_else(|| member.first_name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| member.last_name.clone()),
            phone: self.phone.clone().unwrap_or_else(|| member.phone.clone()),
            email: self.email.clone().unwrap_or_else(|| member.email.clone()),
            status: self.status.unwrap_or(member.status),
            year: self.year.unwrap_or(member.year),
            details: self
                .details
                .clone()
                .unwrap_or_else(|| member.details.clone()),
            attributes: self.attributes.clone(),
        }
    }
}

/// Number of members per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub members: i64,
    pub athletes: i64,
    pub students: i64,
    pub interested: i64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::Members => self.members,
            Category::Athletes => self.athletes,
            Category::Students => self.students,
            Category::Interested => self.interested,
        }
    }

    pub fn add(&mut self, category: Category, n: i64) {
        match category {
            Category::Members => self.members += n,
            Category::Athletes => self.athletes += n,
            Category::Students => self.students += n,
            Category::Interested => self.interested += n,
        }
    }

    pub fn total(&self) -> i64 {
        self.members + self.athletes + self.students + self.interested
    }
}

// =============================================================================
// Custom fields
// =============================================================================

/// A user-defined attribute scoped to a set of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: FieldId,
    /// Normalised label; unique across fields.
    pub key: String,
    pub label: String,
    pub categories: BTreeSet<Category>,
    pub created_at: DateTime<Utc>,
}

impl CustomField {
    pub fn applies_to(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Comma separated category labels, for display.
    pub fn categories_label(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A custom field about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomField {
    pub key: String,
    pub label: String,
    pub categories: BTreeSet<Category>,
}

impl NewCustomField {
    /// Build a definition from a user label, validating it.
    pub fn new(label: &str, categories: BTreeSet<Category>) -> ClubResult<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ClubError::validation("label", "field name is required"));
        }
        if categories.is_empty() {
            return Err(ClubError::validation(
                "categories",
                "select at least one category",
            ));
        }
        Ok(Self {
            key: Self::normalize_key(label),
            label: label.to_string(),
            categories,
        })
    }

    /// Key used for duplicate detection: trimmed, lower-cased, inner
    /// whitespace collapsed.
    pub fn normalize_key(label: &str) -> String {
        label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(details: CategoryDetails) -> Member {
        Member {
            id: 1,
            first_name: "Maria".into(),
            last_name: "Papadopoulou".into(),
            phone: Some("2101234567".into()),
            email: Some("maria@example.com".into()),
            status: MemberStatus::Active,
            year: Some(2019),
            details,
            attributes: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_parse_accepts_labels() {
        assert_eq!(Category::parse("athletes"), Some(Category::Athletes));
        assert_eq!(Category::parse(" Students "), Some(Category::Students));
        assert_eq!(Category::parse("ΜΕΛΟΣ"), Some(Category::Members));
        assert_eq!(Category::parse("ενδιαφερομενος"), Some(Category::Interested));
        assert_eq!(Category::parse("member"), Some(Category::Members));
        assert_eq!(Category::parse("coaches"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_category_from_str_error() {
        let err = "coaches".parse::<Category>().unwrap_err();
        assert_eq!(err.field(), Some("category"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(MemberStatus::parse("ΝΑΙ"), Some(MemberStatus::Active));
        assert_eq!(MemberStatus::parse("ΟΧΙ"), Some(MemberStatus::Inactive));
        assert_eq!(MemberStatus::parse("Inactive"), Some(MemberStatus::Inactive));
        assert_eq!(MemberStatus::parse("maybe"), None);
    }

    #[test]
    fn test_month_parse() {
        assert_eq!(Month::parse("March"), Some(Month::March));
        assert_eq!(Month::parse("sep"), Some(Month::September));
        assert_eq!(Month::parse("12"), Some(Month::December));
        assert_eq!(Month::parse("Μάιος"), Some(Month::May));
        assert_eq!(Month::parse("13"), None);
        assert_eq!(Month::parse("0"), None);
        assert_eq!(Month::May.number(), 5);
        assert_eq!(Month::from_number(1), Some(Month::January));
    }

    #[test]
    fn test_details_from_columns_ignores_foreign_columns() {
        let details = CategoryDetails::from_columns(
            Category::Athletes,
            Some(Month::May),
            Some(2024),
            Some("A-17".into()),
            Some(true),
        );
        assert_eq!(
            details,
            CategoryDetails::Athletes {
                federation_number: Some("A-17".into())
            }
        );
        assert_eq!(details.month(), None);
        assert_eq!(details.subscription_year(), None);
        assert_eq!(details.university(), None);
    }

    #[test]
    fn test_details_serialize_tagged() {
        let details = CategoryDetails::Students {
            period_month: Some(Month::October),
            university: true,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["category"], "students");
        assert_eq!(json["period_month"], "october");
    }

    #[test]
    fn test_draft_validate_requires_names() {
        let draft = MemberDraft::new("  ", "Papas", Category::Members);
        assert_eq!(draft.validate().unwrap_err().field(), Some("first_name"));

        let draft = MemberDraft::new("Nikos", "", Category::Members);
        assert_eq!(draft.validate().unwrap_err().field(), Some("last_name"));

        assert!(MemberDraft::new("Nikos", "Papas", Category::Members)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_draft_validate_email_and_year() {
        let mut draft = MemberDraft::new("Nikos", "Papas", Category::Members);
        draft.email = Some("not-an-email".into());
        assert_eq!(draft.validate().unwrap_err().field(), Some("email"));

        draft.email = Some("nikos@example.com".into());
        draft.year = Some(1850);
        assert_eq!(draft.validate().unwrap_err().field(), Some("year"));
    }

    #[test]
    fn test_draft_normalized_blanks() {
        let mut draft = MemberDraft::new(" Eleni ", " Kosta ", Category::Athletes);
        draft.phone = Some("   ".into());
        draft.details = CategoryDetails::Athletes {
            federation_number: Some(" ".into()),
        };
        draft.attributes.insert(3, " x ".into());
        let draft = draft.normalized();
        assert_eq!(draft.first_name, "Eleni");
        assert_eq!(draft.last_name, "Kosta");
        assert_eq!(draft.phone, None);
        assert_eq!(draft.details.federation_number(), None);
        assert_eq!(draft.attributes[&3], "x");
    }

    #[test]
    fn test_patch_apply_keeps_untouched_columns() {
        let member = stored(CategoryDetails::Members {
            joined_month: Some(Month::May),
            subscription_year: Some(2024),
        });
        let patch = MemberPatch {
            email: Some(None),
            details: Some(CategoryDetails::empty(Category::Students)),
            ..Default::default()
        };
        let draft = patch.apply_to(&member);
        assert_eq!(draft.first_name, "Maria");
        assert_eq!(draft.phone.as_deref(), Some("2101234567"));
        assert_eq!(draft.email, None);
        assert_eq!(draft.category(), Category::Students);
        assert!(MemberPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_new_custom_field_validation() {
        let cats: BTreeSet<_> = [Category::Members].into_iter().collect();
        assert!(NewCustomField::new("  ", cats.clone()).is_err());
        assert!(NewCustomField::new("ΑΜΚΑ", BTreeSet::new()).is_err());

        let field = NewCustomField::new("  Shirt   Size ", cats).unwrap();
        assert_eq!(field.label, "Shirt   Size");
        assert_eq!(field.key, "shirt size");
    }

    #[test]
    fn test_counts_total() {
        let mut counts = CategoryCounts::default();
        counts.add(Category::Members, 3);
        counts.add(Category::Students, 2);
        assert_eq!(counts.get(Category::Members), 3);
        assert_eq!(counts.total(), 5);
    }
}
