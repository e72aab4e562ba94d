//! Page templates for custom fields, settings and imports.

use clubhouse_core::{Category, CustomField, DashboardConfig};
use clubhouse_spreadsheet::{ImportMapping, ImportReport, ScalarField, SheetData};
use uuid::Uuid;

use crate::forms::{FieldErrors, FormData, value};
use crate::templates::{
    alert, badge, card, checkbox, delete_button, empty_state, escape, input, layout, page_header,
    select, submit_button, table,
};

// =============================================================================
// Custom fields
// =============================================================================

pub fn fields_page(
    club: Option<&str>,
    fields: &[CustomField],
    form: &FormData,
    errors: &FieldErrors,
    notice: Option<&str>,
) -> String {
    let list = if fields.is_empty() {
        empty_state(
            "list-check",
            "No custom fields",
            "Define a field to record extra information for some categories.",
            None,
        )
    } else {
        let headers: Vec<String> = ["Name", "Key", "Categories", "Created", ""]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows: Vec<Vec<String>> = fields
            .iter()
            .map(|f| {
                vec![
                    format!(r#"<span class="font-medium">{}</span>"#, escape(&f.label)),
                    format!(r#"<code class="text-xs">{}</code>"#, escape(&f.key)),
                    f.categories
                        .iter()
                        .map(|c| badge(c.label(), "blue"))
                        .collect::<Vec<_>>()
                        .join(" "),
                    f.created_at.format("%Y-%m-%d").to_string(),
                    delete_button(
                        &format!("/fields/{}/delete", f.id),
                        "Delete this field and every value stored for it?",
                    ),
                ]
            })
            .collect();
        table(&headers, &rows)
    };

    let checkboxes: String = Category::ALL
        .into_iter()
        .map(|c| {
            let name = format!("cat_{}", c.slug());
            checkbox(&name, c.label(), value(form, &name) == "on")
        })
        .collect();
    let categories_error = errors.get("categories").map_or(String::new(), |e| {
        format!(r#"<p class="text-sm text-red-600">{}</p>"#, escape(e))
    });
    let new_field = format!(
        r##"<form method="post" action="/fields" class="space-y-4">
            {label}
            <div class="space-y-1">
                <span class="block text-sm font-medium text-gray-700 dark:text-gray-300">Applies to</span>
                <div class="flex flex-wrap gap-4">{checkboxes}</div>
                {categories_error}
            </div>
            {submit}
        </form>"##,
        label = input("label", "Field name", "text", value(form, "label"), errors.get("label")),
        submit = submit_button("Add field", "primary"),
    );

    let content = format!(
        r##"{header}
        {notice}
        <div class="grid grid-cols-1 lg:grid-cols-3 gap-6">
            <div class="lg:col-span-2 bg-white dark:bg-gray-800 rounded-xl shadow-sm border border-gray-200 dark:border-gray-700 overflow-hidden">
                {list}
            </div>
            {new_field}
        </div>"##,
        header = page_header(
            "Custom fields",
            "Extra information recorded for selected categories",
            ""
        ),
        notice = notice.map_or(String::new(), |n| alert("success", n)),
        new_field = card("New field", &new_field),
    );
    layout(club, "Custom fields", &content)
}

// =============================================================================
// Settings
// =============================================================================

pub struct SettingsView<'a> {
    pub club: Option<&'a str>,
    pub club_name_input: &'a str,
    pub project_url: Option<&'a str>,
    pub config: &'a DashboardConfig,
    pub pending_uploads: usize,
    pub errors: &'a FieldErrors,
    pub notice: Option<&'a str>,
}

fn info_row(label: &str, value: &str) -> String {
    format!(
        r##"<div class="flex items-center justify-between p-3 bg-gray-50 dark:bg-gray-700/50 rounded-lg">
            <span class="text-gray-600 dark:text-gray-400">{label}</span>
            <code class="text-sm">{value}</code>
        </div>"##,
        value = escape(value),
    )
}

pub fn settings_page(view: &SettingsView<'_>) -> String {
    let rename = format!(
        r##"<form method="post" action="/settings" class="space-y-4">
            {name}
            {submit}
        </form>"##,
        name = input(
            "club_name",
            "Club name",
            "text",
            view.club_name_input,
            view.errors.get("club_name")
        ),
        submit = submit_button("Save", "primary"),
    );
    let connection = [
        info_row("Project", view.project_url.unwrap_or("-")),
        info_row("Listen address", &view.config.bind_address()),
        info_row(
            "Upload limit",
            &format!("{} KiB", view.config.max_upload_bytes / 1024),
        ),
        info_row(
            "Pending uploads",
            &format!("{} / {}", view.pending_uploads, view.config.max_pending_uploads),
        ),
    ]
    .concat();

    let content = format!(
        r##"{header}
        {notice}
        <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
            {rename}
            {connection}
        </div>"##,
        header = page_header("Settings", "Club name and connection", ""),
        notice = view.notice.map_or(String::new(), |n| alert("success", n)),
        rename = card("Club", &rename),
        connection = card(
            "Connection",
            &format!(r#"<div class="space-y-4">{connection}</div>"#)
        ),
    );
    layout(view.club, "Settings", &content)
}

// =============================================================================
// Import
// =============================================================================

pub fn import_upload_page(club: Option<&str>, max_upload_bytes: usize, error: Option<&str>) -> String {
    let form = format!(
        r##"<form method="post" action="/import" enctype="multipart/form-data" class="space-y-4">
            <div class="space-y-1">
                <label for="file" class="block text-sm font-medium text-gray-700 dark:text-gray-300">Excel workbook (.xlsx)</label>
                <input type="file" name="file" id="file" accept=".xlsx,application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                       class="block w-full text-sm text-gray-700 dark:text-gray-300">
                <p class="text-xs text-gray-500">Up to {limit} KiB. The first row must hold column headers.</p>
            </div>
            {submit}
        </form>"##,
        limit = max_upload_bytes / 1024,
        submit = submit_button("Upload", "primary"),
    );
    let content = format!(
        r##"{header}
        {error}
        <div class="max-w-2xl">{card}</div>"##,
        header = page_header("Import", "Add people from a spreadsheet", ""),
        error = error.map_or(String::new(), |e| alert("error", e)),
        card = card("Upload", &form),
    );
    layout(club, "Import", &content)
}

pub struct MappingView<'a> {
    pub club: Option<&'a str>,
    pub token: Uuid,
    pub file_name: &'a str,
    pub sheet_names: &'a [&'a str],
    pub sheet: &'a SheetData,
    pub mapping: &'a ImportMapping,
    pub fields: &'a [CustomField],
    pub errors: &'a FieldErrors,
    pub form_error: Option<&'a str>,
}

/// Rows shown under the mapping form.
const PREVIEW_ROWS: usize = 5;

fn column_options(headers: &[String], selected: Option<&str>) -> Vec<(String, String, bool)> {
    let mut options = vec![(String::new(), "(not imported)".to_string(), selected.is_none())];
    options.extend(
        headers
            .iter()
            .filter(|h| !h.trim().is_empty())
            .map(|h| (h.clone(), h.clone(), Some(h.trim()) == selected)),
    );
    options
}

pub fn import_mapping_page(view: &MappingView<'_>) -> String {
    let sheet = view.sheet;
    let sheet_picker: String = if view.sheet_names.len() > 1 {
        let options: Vec<(String, String, bool)> = view
            .sheet_names
            .iter()
            .map(|n| (n.to_string(), n.to_string(), *n == sheet.name))
            .collect();
        format!(
            r##"<form method="get" action="/import/{token}" class="mb-6 flex items-end gap-2">
                <div class="w-64">{select}</div>
                {submit}
            </form>"##,
            token = view.token,
            select = select("sheet", "Sheet", &options, None),
            submit = submit_button("Open", "secondary"),
        )
    } else {
        String::new()
    };

    let scalar: String = ScalarField::ALL
        .into_iter()
        .map(|f| {
            let name = format!("map_{}", f.key());
            let required = matches!(f, ScalarField::FirstName | ScalarField::LastName);
            let label = if required {
                format!("{} *", f.label())
            } else {
                f.label().to_string()
            };
            select(
                &name,
                &label,
                &column_options(&sheet.headers, view.mapping.column_for(f)),
                view.errors.get(&name),
            )
        })
        .collect();

    let custom: String = view
        .fields
        .iter()
        .map(|f| {
            let name = format!("map_cf_{}", f.id);
            select(
                &name,
                &format!("{} ({})", f.label, f.categories_label()),
                &column_options(
                    &sheet.headers,
                    view.mapping.custom.get(&f.id).map(String::as_str),
                ),
                view.errors.get(&name),
            )
        })
        .collect();

    let mut category_options = vec![(
        String::new(),
        "(use the category column)".to_string(),
        view.mapping.default_category.is_none(),
    )];
    category_options.extend(Category::ALL.into_iter().map(|c| {
        (
            c.slug().to_string(),
            c.label().to_string(),
            view.mapping.default_category == Some(c),
        )
    }));

    let preview_headers: Vec<String> = sheet.headers.clone();
    let preview_rows: Vec<Vec<String>> = sheet
        .rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| row.iter().map(|c| escape(c)).collect())
        .collect();

    let mapping_form = format!(
        r##"<form method="post" action="/import/{token}" class="space-y-6">
            <input type="hidden" name="sheet" value="{sheet_name}">
            <div class="grid grid-cols-1 md:grid-cols-3 gap-4">{scalar}</div>
            {custom_section}
            <div class="w-64">{default_category}</div>
            {submit}
        </form>"##,
        token = view.token,
        sheet_name = escape(&sheet.name),
        custom_section = if custom.is_empty() {
            String::new()
        } else {
            format!(
                r#"<h4 class="font-medium text-gray-900 dark:text-white">Custom fields</h4><div class="grid grid-cols-1 md:grid-cols-3 gap-4">{custom}</div>"#
            )
        },
        default_category = select(
            "default_category",
            "Default category",
            &category_options,
            view.errors.get("map_category")
        ),
        submit = submit_button("Import rows", "primary"),
    );

    let content = format!(
        r##"{header}
        {form_error}
        {sheet_picker}
        <div class="space-y-6">
            {mapping}
            {preview}
        </div>"##,
        header = page_header(
            "Map columns",
            &format!("{} / {} ({} rows)", view.file_name, sheet.name, sheet.rows.len()),
            ""
        ),
        form_error = view.form_error.map_or(String::new(), |e| alert("error", e)),
        mapping = card("Column mapping", &mapping_form),
        preview = card("Preview", &table(&preview_headers, &preview_rows)),
    );
    layout(view.club, "Import", &content)
}

pub fn import_report_page(
    club: Option<&str>,
    file_name: &str,
    sheet_name: &str,
    report: &ImportReport,
) -> String {
    let skipped = if report.skipped.is_empty() {
        String::new()
    } else {
        let headers = vec!["Row".to_string(), "Reason".to_string()];
        let rows: Vec<Vec<String>> = report
            .skipped
            .iter()
            .map(|s| vec![s.row.to_string(), escape(&s.reason)])
            .collect();
        card(
            &format!("Skipped rows ({})", report.skipped.len()),
            &table(&headers, &rows),
        )
    };
    let summary = if report.skipped.is_empty() {
        alert(
            "success",
            &format!("Imported {} people from {}.", report.inserted, sheet_name),
        )
    } else {
        alert(
            "warning",
            &format!(
                "Imported {} people from {}; {} rows were skipped.",
                report.inserted,
                sheet_name,
                report.skipped.len()
            ),
        )
    };
    let content = format!(
        r##"{header}
        {summary}
        {skipped}
        <div class="mt-6 flex gap-2">
            <a href="/members" class="bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium">View people</a>
            <a href="/import" class="px-4 py-2 text-gray-500 hover:text-gray-700">Import another file</a>
        </div>"##,
        header = page_header("Import finished", file_name, ""),
    );
    layout(club, "Import", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_spreadsheet::SkippedRow;

    fn sheet() -> SheetData {
        SheetData {
            name: "Μέλη".into(),
            headers: vec!["Όνομα".into(), "Επώνυμο".into(), "Notes".into()],
            rows: vec![vec!["Maria".into(), "<b>".into(), "".into()]],
        }
    }

    #[test]
    fn test_mapping_page_preselects_suggestion() {
        let sheet = sheet();
        let mapping = ImportMapping::suggest(&sheet.headers, &[]);
        let html = import_mapping_page(&MappingView {
            club: None,
            token: Uuid::nil(),
            file_name: "members.xlsx",
            sheet_names: &["Μέλη"],
            sheet: &sheet,
            mapping: &mapping,
            fields: &[],
            errors: &FieldErrors::default(),
            form_error: None,
        });
        assert!(html.contains(r#"<option value="Όνομα" selected>Όνομα</option>"#));
        assert!(html.contains(r#"<option value="Notes">Notes</option>"#));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("/import/00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_report_lists_skipped_rows() {
        let report = ImportReport {
            inserted: 2,
            skipped: vec![SkippedRow {
                row: 3,
                reason: "field not applicable to category".into(),
            }],
        };
        let html = import_report_page(None, "a.xlsx", "Μέλη", &report);
        assert!(html.contains("Imported 2 people"));
        assert!(html.contains("field not applicable to category"));
        assert!(html.contains("Skipped rows (1)"));
    }
}
