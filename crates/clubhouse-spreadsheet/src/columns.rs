//! Fixed member columns that a sheet column can map to.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    FirstName,
    LastName,
    Phone,
    Email,
    Category,
    Status,
    Year,
    Month,
    SubscriptionYear,
    FederationNumber,
    University,
}

impl ScalarField {
    /// Export column order.
    pub const ALL: [ScalarField; 11] = [
        ScalarField::FirstName,
        ScalarField::LastName,
        ScalarField::Phone,
        ScalarField::Email,
        ScalarField::Category,
        ScalarField::Status,
        ScalarField::Year,
        ScalarField::Month,
        ScalarField::SubscriptionYear,
        ScalarField::FederationNumber,
        ScalarField::University,
    ];

    /// Identifier used in mapping files and form inputs.
    pub fn key(self) -> &'static str {
        match self {
            ScalarField::FirstName => "first_name",
            ScalarField::LastName => "last_name",
            ScalarField::Phone => "phone",
            ScalarField::Email => "email",
            ScalarField::Category => "category",
            ScalarField::Status => "status",
            ScalarField::Year => "year",
            ScalarField::Month => "month",
            ScalarField::SubscriptionYear => "subscription_year",
            ScalarField::FederationNumber => "federation_number",
            ScalarField::University => "university",
        }
    }

    /// Export header.
    pub fn label(self) -> &'static str {
        match self {
            ScalarField::FirstName => "First name",
            ScalarField::LastName => "Last name",
            ScalarField::Phone => "Phone",
            ScalarField::Email => "Email",
            ScalarField::Category => "Category",
            ScalarField::Status => "Status",
            ScalarField::Year => "Year",
            ScalarField::Month => "Month",
            ScalarField::SubscriptionYear => "Subscription year",
            ScalarField::FederationNumber => "Federation number",
            ScalarField::University => "University",
        }
    }

    /// Header used in the club's older Greek spreadsheets.
    pub fn greek_label(self) -> &'static str {
        match self {
            ScalarField::FirstName => "Όνομα",
            ScalarField::LastName => "Επώνυμο",
            ScalarField::Phone => "Τηλέφωνο",
            ScalarField::Email => "Email",
            ScalarField::Category => "Κατηγορία",
            ScalarField::Status => "Κατάσταση",
            ScalarField::Year => "Έτος",
            ScalarField::Month => "Μήνας",
            ScalarField::SubscriptionYear => "Έτος συνδρομής",
            ScalarField::FederationNumber => "ΑΜ ΕΟΜ",
            ScalarField::University => "Πανεπιστήμιο",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Whether `header` names this field, ignoring case and surrounding
    /// whitespace.
    pub fn matches_header(self, header: &str) -> bool {
        let header = header.trim().to_lowercase();
        header == self.key()
            || header == self.label().to_lowercase()
            || header == self.greek_label().to_lowercase()
    }
}

/// Sheet header for a custom field. Labels that would read as a fixed
/// column get a `(custom)` suffix.
pub fn custom_column_header(label: &str) -> String {
    if ScalarField::ALL.into_iter().any(|f| f.matches_header(label)) {
        format!("{} (custom)", label.trim())
    } else {
        label.trim().to_string()
    }
}

impl fmt::Display for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
