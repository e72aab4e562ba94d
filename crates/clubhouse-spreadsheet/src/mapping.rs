//! Column mapping for imports.
//!
//! A mapping names, for each target field, the sheet header whose column
//! feeds it. It is checked against the sheet and the field catalogue before
//! any row is written.
//!
//! ```yaml
//! scalar:
//!   first_name: Όνομα
//!   last_name: Επώνυμο
//!   email: Email
//! custom:
//!   3: ΑΜΚΑ
//! default_category: members
//! ```

use clubhouse_core::{Category, ClubError, ClubResult, CustomField, FieldId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::columns::{ScalarField, custom_column_header};
use crate::workbook::SheetData;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMapping {
    /// Target field → sheet header.
    #[serde(default)]
    pub scalar: BTreeMap<ScalarField, String>,
    /// Custom field id → sheet header.
    #[serde(default)]
    pub custom: BTreeMap<FieldId, String>,
    /// Category for rows without a category column or value.
    #[serde(default)]
    pub default_category: Option<Category>,
}

/// A mapping resolved to column indices of one sheet.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedMapping {
    pub scalar: BTreeMap<ScalarField, usize>,
    pub custom: BTreeMap<FieldId, usize>,
    pub default_category: Option<Category>,
}

impl ImportMapping {
    /// Map every header that equals a field's key, English or Greek label
    /// (scalar fields) or a custom field's label or export header, ignoring
    /// case.
    pub fn suggest(headers: &[String], fields: &[CustomField]) -> Self {
        let mut mapping = ImportMapping::default();
        for header in headers {
            if header.trim().is_empty() {
                continue;
            }
            if let Some(field) = ScalarField::ALL
                .into_iter()
                .find(|f| f.matches_header(header))
            {
                mapping
                    .scalar
                    .entry(field)
                    .or_insert_with(|| header.trim().to_string());
                continue;
            }
            let wanted = header.trim().to_lowercase();
            if let Some(field) = fields
                .iter()
                .find(|f| {
                    f.label.to_lowercase() == wanted
                        || f.key == wanted
                        || custom_column_header(&f.label).to_lowercase() == wanted
                })
            {
                mapping
                    .custom
                    .entry(field.id)
                    .or_insert_with(|| header.trim().to_string());
            }
        }
        mapping
    }

    pub fn column_for(&self, field: ScalarField) -> Option<&str> {
        self.scalar.get(&field).map(String::as_str)
    }

    /// Check the mapping against `sheet` and the defined `fields`.
    pub fn validate(&self, sheet: &SheetData, fields: &[CustomField]) -> ClubResult<()> {
        self.resolve(sheet, fields).map(|_| ())
    }

    pub(crate) fn resolve(
        &self,
        sheet: &SheetData,
        fields: &[CustomField],
    ) -> ClubResult<ResolvedMapping> {
        for required in [ScalarField::FirstName, ScalarField::LastName] {
            if self.column_for(required).is_none_or(|c| c.trim().is_empty()) {
                return Err(ClubError::validation(
                    format!("map_{}", required.key()),
                    format!("{} must be mapped to a column", required.label()),
                ));
            }
        }
        if self.column_for(ScalarField::Category).is_none() && self.default_category.is_none() {
            return Err(ClubError::validation(
                "map_category",
                "map a category column or choose a default category",
            ));
        }

        let mut scalar = BTreeMap::new();
        for (field, header) in &self.scalar {
            let index = locate(sheet, header, format!("map_{}", field.key()))?;
            scalar.insert(*field, index);
        }

        let mut custom = BTreeMap::new();
        for (field_id, header) in &self.custom {
            if !fields.iter().any(|f| f.id == *field_id) {
                return Err(ClubError::field_not_found(*field_id));
            }
            let index = locate(sheet, header, format!("map_cf_{}", field_id))?;
            custom.insert(*field_id, index);
        }

        Ok(ResolvedMapping {
            scalar,
            custom,
            default_category: self.default_category,
        })
    }
}

/// Index of the one column headed `header`. A header used by more than one
/// column cannot be mapped.
fn locate(sheet: &SheetData, header: &str, input: String) -> ClubResult<usize> {
    let wanted = header.trim();
    let mut matches = sheet
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.trim() == wanted)
        .map(|(index, _)| index);
    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => Err(ClubError::validation(
            input,
            format!("column '{}' not found in sheet '{}'", wanted, sheet.name),
        )),
        (Some(_), Some(_)) => Err(ClubError::validation(
            input,
            format!(
                "column '{}' appears more than once in sheet '{}'",
                wanted, sheet.name
            ),
        )),
    }
}
