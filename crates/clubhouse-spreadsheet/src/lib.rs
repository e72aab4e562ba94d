//! # clubhouse-spreadsheet
//!
//! Excel import and export.
//!
//! - [`Workbook`] reads uploads into [`SheetData`] (header row + text cells)
//! - [`ImportMapping`] says which column feeds which field and is checked
//!   before any write
//! - [`import_sheet`] inserts rows one at a time and reports skipped rows
//! - [`export_members`] writes one sheet with fixed columns followed by the
//!   applicable custom fields, every header distinct

pub mod columns;
pub mod export;
pub mod import;
pub mod mapping;
pub mod workbook;

pub use columns::{ScalarField, custom_column_header};
pub use export::{
    PREFIX_ALL, PREFIX_FILTERED, SHEET_ALL, SHEET_FILTERED, SHEET_MEMBERS, export_filename,
    custom_headers, export_members, exported_fields,
};
pub use import::{DUPLICATE_MEMBER, ImportReport, SkippedRow, import_sheet};
pub use mapping::ImportMapping;
pub use workbook::{SheetData, Workbook};
