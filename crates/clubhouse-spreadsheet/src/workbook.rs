//! Reading uploaded workbooks.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use clubhouse_core::{ClubError, ClubResult};
use std::io::Cursor;

/// One worksheet: a header row and string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    /// Data rows, each padded to the header width.
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    /// Index of the first column whose trimmed header equals `header`.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        let header = header.trim();
        self.headers.iter().position(|h| h == header)
    }

    /// Trimmed cell text, empty for missing cells.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_none_or(|cells| cells.iter().all(|c| c.trim().is_empty()))
    }
}

/// A parsed workbook with every sheet loaded.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<SheetData>,
}

impl Workbook {
    /// Parse `.xlsx` (or any format calamine detects) from memory.
    pub fn from_bytes(bytes: &[u8]) -> ClubResult<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ClubError::Spreadsheet(format!("cannot read workbook: {}", e)))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ClubError::Spreadsheet(format!("cannot read sheet '{}': {}", name, e)))?;
            let mut rows = range.rows();
            let headers: Vec<String> = rows
                .next()
                .map(|r| r.iter().map(|c| cell_text(c).trim().to_string()).collect())
                .unwrap_or_default();
            let width = headers.len();
            let data = rows
                .map(|r| {
                    let mut cells: Vec<String> = r.iter().map(cell_text).collect();
                    cells.resize(width.max(cells.len()), String::new());
                    cells
                })
                .collect();
            sheets.push(SheetData {
                name,
                headers,
                rows: data,
            });
        }
        tracing::debug!(sheets = sheets.len(), "Workbook parsed");
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> ClubResult<&SheetData> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ClubError::Spreadsheet(format!("sheet '{}' not found", name)))
    }

    /// The first sheet, if the workbook has any.
    pub fn first_sheet(&self) -> Option<&SheetData> {
        self.sheets.first()
    }
}

/// Render a cell the way a user would type it.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Whole numbers lose the decimal part so years and phone numbers survive.
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook as XlsxWorkbook;

    fn build() -> Vec<u8> {
        let mut wb = XlsxWorkbook::new();
        let sheet = wb.add_worksheet();
        sheet.set_name("Μέλη").unwrap();
        sheet.write_string(0, 0, "Όνομα").unwrap();
        sheet.write_string(0, 1, " Έτος ").unwrap();
        sheet.write_string(0, 2, "Τηλέφωνο").unwrap();
        sheet.write_string(1, 0, "Maria").unwrap();
        sheet.write_number(1, 1, 2019.0).unwrap();
        sheet.write_number(1, 2, 2101234567.0).unwrap();
        sheet.write_string(3, 0, "Nikos").unwrap();
        sheet.write_number(3, 1, 12.5).unwrap();
        wb.add_worksheet().set_name("Άλλο").unwrap();
        wb.save_to_buffer().unwrap()
    }

    #[test]
    fn test_reads_sheets_and_cells() {
        let wb = Workbook::from_bytes(&build()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Μέλη", "Άλλο"]);

        let sheet = wb.sheet("Μέλη").unwrap();
        assert_eq!(sheet.headers, vec!["Όνομα", "Έτος", "Τηλέφωνο"]);
        assert_eq!(sheet.column_index("Έτος"), Some(1));
        assert_eq!(sheet.cell(0, 1), "2019");
        assert_eq!(sheet.cell(0, 2), "2101234567");
        assert!(sheet.row_is_blank(1));
        assert_eq!(sheet.cell(2, 1), "12.5");
        assert_eq!(sheet.cell(2, 2), "");
        assert_eq!(sheet.cell(10, 0), "");
    }

    #[test]
    fn test_missing_sheet_and_garbage_bytes() {
        let wb = Workbook::from_bytes(&build()).unwrap();
        assert_eq!(wb.sheet("Nope").unwrap_err().kind(), "spreadsheet");
        let err = Workbook::from_bytes(b"not a workbook").unwrap_err();
        assert_eq!(err.kind(), "spreadsheet");
    }
}
