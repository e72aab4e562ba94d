//! `clubhouse export` - write members to an `.xlsx` file.

use anyhow::{Context, Result};
use clubhouse_core::{Category, ClubConfig, MemberFilter};
use clubhouse_runtime::Services;
use clubhouse_spreadsheet::{SHEET_ALL, SHEET_MEMBERS, export_members};
use std::fs;
use std::path::Path;

pub async fn run(config: ClubConfig, out: &Path, category: Option<Category>) -> Result<()> {
    let (store, _) = super::connect(&config).await?;
    let services = Services::new(store.clone());
    let result = write_export(&services, out, category).await;
    store.close().await;

    let rows = result?;
    println!("Exported {} people to {}", rows, out.display());
    Ok(())
}

/// Export through `services` and write the workbook to `out`.
pub async fn write_export(
    services: &Services,
    out: &Path,
    category: Option<Category>,
) -> Result<usize> {
    let (filter, sheet_name) = match category {
        Some(c) => (MemberFilter::for_category(c), SHEET_MEMBERS),
        None => (MemberFilter::default(), SHEET_ALL),
    };
    let members = services.members.list(filter).await?;
    let fields = services.fields.list_fields().await?;
    let bytes = export_members(&members, &fields, sheet_name)?;
    fs::write(out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(members.len())
}
