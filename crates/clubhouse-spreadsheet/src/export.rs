//! Writing members to `.xlsx`.

use chrono::NaiveDateTime;
use clubhouse_core::{ClubError, ClubResult, CustomField, Member};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::columns::{ScalarField, custom_column_header};

/// Sheet name for exports of one category.
pub const SHEET_MEMBERS: &str = "Μέλη";
/// Sheet name for filtered exports.
pub const SHEET_FILTERED: &str = "Φιλτραρισμένα";
/// Sheet name for full exports.
pub const SHEET_ALL: &str = "Όλα";

pub const PREFIX_ALL: &str = "all_data";
pub const PREFIX_FILTERED: &str = "filtered_data";

/// `{prefix}_{YYYYmmdd_HHMMSS}.xlsx`
pub fn export_filename(prefix: &str, now: NaiveDateTime) -> String {
    format!("{}_{}.xlsx", prefix, now.format("%Y%m%d_%H%M%S"))
}

/// Custom fields that apply to at least one of `members`, in the given
/// order.
pub fn exported_fields<'a>(members: &[Member], fields: &'a [CustomField]) -> Vec<&'a CustomField> {
    fields
        .iter()
        .filter(|f| members.iter().any(|m| f.applies_to(m.category())))
        .collect()
}

fn xlsx_err(e: XlsxError) -> ClubError {
    ClubError::Spreadsheet(e.to_string())
}

/// Headers for the custom columns. Every header in the sheet is distinct:
/// collisions with fixed columns get a suffix, and a header still taken
/// after that carries the field id.
pub fn custom_headers(columns: &[&CustomField]) -> Vec<String> {
    let mut taken: Vec<String> = ScalarField::ALL
        .iter()
        .map(|f| f.label().to_lowercase())
        .collect();
    let mut headers = Vec::with_capacity(columns.len());
    for field in columns {
        let mut header = custom_column_header(&field.label);
        if taken.contains(&header.to_lowercase()) {
            header = format!("{} #{}", header, field.id);
        }
        taken.push(header.to_lowercase());
        headers.push(header);
    }
    headers
}

/// Write `members` to a single-sheet workbook and return its bytes.
pub fn export_members(
    members: &[Member],
    fields: &[CustomField],
    sheet_name: &str,
) -> ClubResult<Vec<u8>> {
    let columns = exported_fields(members, fields);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).map_err(xlsx_err)?;

    let header = Format::new().set_bold();
    let mut col: u16 = 0;
    for field in ScalarField::ALL {
        sheet
            .write_string_with_format(0, col, field.label(), &header)
            .map_err(xlsx_err)?;
        col += 1;
    }
    for label in custom_headers(&columns) {
        sheet
            .write_string_with_format(0, col, &label, &header)
            .map_err(xlsx_err)?;
        col += 1;
    }

    for (i, member) in members.iter().enumerate() {
        let row = i as u32 + 1;
        write_member(sheet, row, member).map_err(xlsx_err)?;
        let mut col = ScalarField::ALL.len() as u16;
        for field in &columns {
            if let Some(value) = member.attribute(field.id) {
                sheet.write_string(row, col, value).map_err(xlsx_err)?;
            }
            col += 1;
        }
    }
    sheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;

    let bytes = workbook.save_to_buffer().map_err(xlsx_err)?;
    tracing::info!(
        rows = members.len(),
        custom_columns = columns.len(),
        sheet = sheet_name,
        "Workbook exported"
    );
    Ok(bytes)
}

fn write_member(sheet: &mut Worksheet, row: u32, member: &Member) -> Result<(), XlsxError> {
    for (col, field) in ScalarField::ALL.into_iter().enumerate() {
        let col = col as u16;
        match field {
            ScalarField::FirstName => {
                sheet.write_string(row, col, &member.first_name)?;
            }
            ScalarField::LastName => {
                sheet.write_string(row, col, &member.last_name)?;
            }
            ScalarField::Phone => {
                if let Some(phone) = &member.phone {
                    sheet.write_string(row, col, phone)?;
                }
            }
            ScalarField::Email => {
                if let Some(email) = &member.email {
                    sheet.write_string(row, col, email)?;
                }
            }
            ScalarField::Category => {
                sheet.write_string(row, col, member.category().label())?;
            }
            ScalarField::Status => {
                sheet.write_string(row, col, member.status.label())?;
            }
            ScalarField::Year => {
                if let Some(year) = member.year {
                    sheet.write_number(row, col, f64::from(year))?;
                }
            }
            ScalarField::Month => {
                if let Some(month) = member.details.month() {
                    sheet.write_string(row, col, month.label())?;
                }
            }
            ScalarField::SubscriptionYear => {
                if let Some(year) = member.details.subscription_year() {
                    sheet.write_number(row, col, f64::from(year))?;
                }
            }
            ScalarField::FederationNumber => {
                if let Some(number) = member.details.federation_number() {
                    sheet.write_string(row, col, number)?;
                }
            }
            ScalarField::University => {
                if let Some(university) = member.details.university() {
                    sheet.write_string(row, col, if university { "Yes" } else { "No" })?;
                }
            }
        }
    }
    Ok(())
}
