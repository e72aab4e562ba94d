//! `clubhouse import` - load members from an `.xlsx` file.
//!
//! The mapping file is YAML:
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

use anyhow::{Context, Result};
use clubhouse_core::ClubConfig;
use clubhouse_runtime::Services;
use clubhouse_spreadsheet::{ImportMapping, ImportReport, Workbook, import_sheet};
use std::fs;
use std::path::Path;

pub async fn run(
    config: ClubConfig,
    file: &Path,
    mapping: Option<&Path>,
    sheet: Option<&str>,
) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let workbook = Workbook::from_bytes(&bytes)?;
    let mapping = mapping.map(load_mapping).transpose()?;

    let (store, _) = super::connect(&config).await?;
    let services = Services::new(store.clone());
    let result = run_import(&services, &workbook, mapping, sheet).await;
    store.close().await;

    let report = result?;
    println!("Imported {} people.", report.inserted);
    if !report.skipped.is_empty() {
        println!("Skipped {} rows:", report.skipped.len());
        for skipped in &report.skipped {
            println!("  row {}: {}", skipped.row, skipped.reason);
        }
    }
    Ok(())
}

pub fn load_mapping(path: &Path) -> Result<ImportMapping> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse mapping file: {}", path.display()))
}

/// Import one sheet. Without an explicit mapping the headers are matched
/// against field names.
pub async fn run_import(
    services: &Services,
    workbook: &Workbook,
    mapping: Option<ImportMapping>,
    sheet: Option<&str>,
) -> Result<ImportReport> {
    let sheet = match sheet {
        Some(name) => workbook.sheet(name)?,
        None => workbook
            .first_sheet()
            .context("The workbook has no sheets")?,
    };
    let mapping = match mapping {
        Some(mapping) => mapping,
        None => {
            let fields = services.fields.list_fields().await?;
            ImportMapping::suggest(&sheet.headers, &fields)
        }
    };
    Ok(import_sheet(&services.members, &services.fields, sheet, &mapping).await?)
}
