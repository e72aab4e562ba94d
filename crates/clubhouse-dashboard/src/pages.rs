//! Page templates for the home and member views.

use clubhouse_core::{
    Category, CategoryCounts, CustomField, Member, MemberFilter, MemberId, MemberStatus, Month,
};

use crate::forms::{FieldErrors, FormData, filter_query_string, value};
use crate::templates::{
    alert, badge, card, checkbox, delete_button, empty_state, escape, input, layout,
    link_button, page_header, select, stats_card, submit_button, table,
};

fn category_color(category: Category) -> &'static str {
    match category {
        Category::Members => "blue",
        Category::Athletes => "orange",
        Category::Students => "purple",
        Category::Interested => "gray",
    }
}

fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Members => "id-card",
        Category::Athletes => "trophy",
        Category::Students => "graduation-cap",
        Category::Interested => "user-clock",
    }
}

// =============================================================================
// First-run setup
// =============================================================================

pub fn setup_page(club_name: &str, error: Option<&str>) -> String {
    let form = format!(
        r##"<form method="post" action="/setup" class="space-y-4">
            {name}
            {submit}
        </form>"##,
        name = input("club_name", "Club name", "text", club_name, error),
        submit = submit_button("Save", "primary"),
    );
    let content = format!(
        r##"<div class="max-w-xl mx-auto mt-12">
            <div class="mb-6 text-center">
                <i class="fas fa-diamond text-5xl text-primary-500 mb-4"></i>
                <h1 class="text-3xl font-bold text-gray-900 dark:text-white">Welcome</h1>
                <p class="mt-2 text-gray-600 dark:text-gray-400">Name your club to get started.</p>
            </div>
            {card}
        </div>"##,
        card = card("Club", &form),
    );
    layout(None, "Setup", &content)
}

// =============================================================================
// Home Page
// =============================================================================

pub fn home_page(club: &str, counts: &CategoryCounts, field_count: usize) -> String {
    let stats: String = Category::ALL
        .into_iter()
        .map(|c| {
            stats_card(
                c.label(),
                &counts.get(c).to_string(),
                category_icon(c),
                category_color(c),
                &format!("/members?category={}", c.slug()),
            )
        })
        .collect();

    let add_links: String = Category::ALL
        .into_iter()
        .map(|c| {
            format!(
                r##"<a href="/members/new?category={slug}" class="flex items-center gap-4 p-4 bg-gray-50 dark:bg-gray-700/50 rounded-lg hover:bg-gray-100 dark:hover:bg-gray-700 transition-colors">
                <div class="w-10 h-10 rounded-full bg-{color}-100 dark:bg-{color}-900/30 flex items-center justify-center">
                    <i class="fas fa-plus text-{color}-500"></i>
                </div>
                <div>
                    <h4 class="font-medium text-gray-900 dark:text-white">Add to {label}</h4>
                    <p class="text-sm text-gray-500 dark:text-gray-400">{greek}</p>
                </div>
            </a>"##,
                slug = c.slug(),
                color = category_color(c),
                label = c.label(),
                greek = c.greek_label(),
            )
        })
        .collect();

    let data_links = format!(
        r##"<div class="space-y-3">
            <div class="flex items-center justify-between p-3 bg-gray-50 dark:bg-gray-700/50 rounded-lg">
                <span class="text-gray-600 dark:text-gray-400">Total people</span>
                <span class="font-semibold">{total}</span>
            </div>
            <div class="flex items-center justify-between p-3 bg-gray-50 dark:bg-gray-700/50 rounded-lg">
                <span class="text-gray-600 dark:text-gray-400">Custom fields</span>
                <a href="/fields" class="font-semibold text-primary-600">{field_count}</a>
            </div>
            <div class="flex gap-2 pt-2">
                {import}
                {export}
            </div>
        </div>"##,
        total = counts.total(),
        import = link_button("Import", "/import", "file-import", "secondary"),
        export = link_button("Export all", "/export?scope=all", "file-export", "secondary"),
    );

    let content = format!(
        r##"<div class="mb-8">
            <h1 class="text-3xl font-bold text-gray-900 dark:text-white">{club}</h1>
            <p class="mt-2 text-gray-600 dark:text-gray-400">Membership overview</p>
        </div>

        <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-6 mb-8">
            {stats}
        </div>

        <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
            {quick_actions}
            {data}
        </div>"##,
        club = escape(club),
        quick_actions = card(
            "Quick Actions",
            &format!(r##"<div class="grid grid-cols-1 md:grid-cols-2 gap-4">{add_links}</div>"##)
        ),
        data = card("Data", &data_links),
    );

    layout(Some(club), "Home", &content)
}

// =============================================================================
// Member list
// =============================================================================

pub struct MembersView<'a> {
    pub club: Option<&'a str>,
    pub members: &'a [Member],
    /// Every defined field.
    pub fields: &'a [CustomField],
    pub counts: &'a CategoryCounts,
    pub query: &'a FormData,
    pub filter: &'a MemberFilter,
    pub errors: &'a FieldErrors,
    pub notice: Option<&'a str>,
}

pub fn members_page(view: &MembersView<'_>) -> String {
    let category = view.filter.category;
    let title = category.map_or("All people", |c| c.label());
    let columns: Vec<&CustomField> = match category {
        Some(c) => view.fields.iter().filter(|f| f.applies_to(c)).collect(),
        None => Vec::new(),
    };

    let rest = filter_query_string(view.query, &["category"]);
    let tab = |href_category: Option<Category>, label: &str, count: i64| {
        let active = href_category == category;
        let mut href = String::from("/members");
        let mut params = Vec::new();
        if let Some(c) = href_category {
            params.push(format!("category={}", c.slug()));
        }
        if !rest.is_empty() {
            params.push(rest.clone());
        }
        if !params.is_empty() {
            href.push('?');
            href.push_str(&params.join("&"));
        }
        let classes = if active {
            "border-primary-600 text-primary-600 dark:text-primary-400"
        } else {
            "border-transparent text-gray-500 hover:text-gray-700 hover:border-gray-300"
        };
        format!(
            r##"<a href="{href}" class="px-4 py-2 border-b-2 font-medium text-sm transition-colors {classes}">{label} <span class="ml-1 text-xs text-gray-400">{count}</span></a>"##,
            href = escape(&href),
        )
    };
    let mut tabs = tab(None, "All", view.counts.total());
    for c in Category::ALL {
        tabs.push_str(&tab(Some(c), c.label(), view.counts.get(c)));
    }

    let export_query = filter_query_string(view.query, &[]);
    let export_href = if export_query.is_empty() {
        "/export?scope=filtered".to_string()
    } else {
        format!("/export?scope=filtered&{}", export_query)
    };
    let new_href = match category {
        Some(c) => format!("/members/new?category={}", c.slug()),
        None => "/members/new".to_string(),
    };
    let actions = [
        link_button("Export filtered", &escape(&export_href), "file-export", "secondary"),
        link_button("Export all", "/export?scope=all", "file-excel", "secondary"),
        link_button("Add", &new_href, "plus", "primary"),
    ]
    .concat();

    let mut messages = String::new();
    if let Some(notice) = view.notice {
        messages.push_str(&alert("success", notice));
    }
    for (_, message) in view.errors.messages() {
        messages.push_str(&alert("warning", message));
    }

    let filter_fields: Vec<&CustomField> = match category {
        Some(_) => columns.clone(),
        None => view.fields.iter().collect(),
    };
    let filter_form = filter_form(view.query, category, &filter_fields);

    let list = if view.members.is_empty() {
        empty_state(
            "users",
            "No people found",
            "Nobody matches the current filters.",
            Some(("Add a person", &new_href)),
        )
    } else {
        let mut headers: Vec<String> = ["Name", "Category", "Status", "Year", "Email", "Phone"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        headers.extend(columns.iter().map(|f| f.label.clone()));
        headers.push(String::new());
        let rows: Vec<Vec<String>> = view
            .members
            .iter()
            .map(|m| member_row(m, &columns))
            .collect();
        table(&headers, &rows)
    };

    let content = format!(
        r##"{header}
        {messages}
        <div class="border-b border-gray-200 dark:border-gray-700 mb-4">
            <nav class="flex gap-2">{tabs}</nav>
        </div>
        {filter_form}
        <div class="bg-white dark:bg-gray-800 rounded-xl shadow-sm border border-gray-200 dark:border-gray-700 overflow-hidden">
            {list}
        </div>
        <p class="mt-4 text-sm text-gray-500 dark:text-gray-400">{shown} shown</p>"##,
        header = page_header(title, category.map_or("", |c| c.greek_label()), &actions),
        shown = view.members.len(),
    );
    layout(view.club, title, &content)
}

fn filter_form(query: &FormData, category: Option<Category>, fields: &[&CustomField]) -> String {
    let hidden_category = category.map_or(String::new(), |c| {
        format!(r#"<input type="hidden" name="category" value="{}">"#, c.slug())
    });
    let mut status_options = vec![(String::new(), "Any status".to_string(), false)];
    status_options.extend(MemberStatus::ALL.into_iter().map(|s| {
        (
            s.slug().to_string(),
            s.label().to_string(),
            MemberStatus::parse(value(query, "status")) == Some(s),
        )
    }));
    let custom: String = fields
        .iter()
        .map(|f| {
            let name = format!("cf_{}", f.id);
            input(&name, &f.label, "text", value(query, &name), None)
        })
        .collect();

    format!(
        r##"<form method="get" action="/members" class="mb-6 bg-white dark:bg-gray-800 rounded-xl shadow-sm border border-gray-200 dark:border-gray-700 p-4" x-data="{{ open: {open} }}">
            {hidden_category}
            <div class="grid grid-cols-1 md:grid-cols-4 gap-4 items-end">
                {q}
                {email}
                {status}
                <div class="flex gap-2">
                    {submit}
                    <a href="/members{reset}" class="px-4 py-2 text-gray-500 hover:text-gray-700">Reset</a>
                    <button type="button" @click="open = !open" class="px-2 py-2 text-gray-500 hover:text-gray-700" title="More filters"><i class="fas fa-sliders"></i></button>
                </div>
            </div>
            <div x-show="open" x-cloak class="grid grid-cols-1 md:grid-cols-4 gap-4 mt-4">
                {year_from}
                {year_to}
                {custom}
            </div>
        </form>"##,
        open = !value(query, "year_from").is_empty()
            || !value(query, "year_to").is_empty()
            || query.keys().any(|k| k.starts_with("cf_") && !value(query, k).is_empty()),
        q = input("q", "Name", "search", value(query, "q"), None),
        email = input("email", "Email", "search", value(query, "email"), None),
        status = select("status", "Status", &status_options, None),
        submit = submit_button("Filter", "primary"),
        reset = category.map_or(String::new(), |c| format!("?category={}", c.slug())),
        year_from = input("year_from", "Year from", "number", value(query, "year_from"), None),
        year_to = input("year_to", "Year to", "number", value(query, "year_to"), None),
    )
}

fn member_row(member: &Member, columns: &[&CustomField]) -> Vec<String> {
    let category = member.category();
    let status = match member.status {
        MemberStatus::Active => badge(member.status.label(), "green"),
        MemberStatus::Inactive => badge(member.status.label(), "red"),
    };
    let mut row = vec![
        format!(
            r#"<a href="/members/{}" class="font-medium text-primary-600 hover:underline">{}</a>"#,
            member.id,
            escape(&member.full_name())
        ),
        badge(category.label(), category_color(category)),
        status,
        member.year.map_or(String::new(), |y| y.to_string()),
        escape(member.email.as_deref().unwrap_or("")),
        escape(member.phone.as_deref().unwrap_or("")),
    ];
    row.extend(
        columns
            .iter()
            .map(|f| escape(member.attribute(f.id).unwrap_or(""))),
    );
    row.push(format!(
        r#"<div class="flex items-center gap-3"><a href="/members/{id}" class="text-gray-500 hover:text-primary-600" title="Edit"><i class="fas fa-pen"></i></a>{delete}</div>"#,
        id = member.id,
        delete = delete_button(
            &format!("/members/{}/delete", member.id),
            "Delete this person?"
        ),
    ));
    row
}

// =============================================================================
// Add / edit form
// =============================================================================

pub struct MemberFormView<'a> {
    pub club: Option<&'a str>,
    /// `None` on the add form.
    pub member_id: Option<MemberId>,
    pub category: Category,
    pub form: &'a FormData,
    /// Fields applicable to `category`.
    pub fields: &'a [CustomField],
    pub errors: &'a FieldErrors,
    pub form_error: Option<&'a str>,
}

fn month_options(selected: &str) -> Vec<(String, String, bool)> {
    let selected = Month::parse(selected);
    let mut options = vec![(String::new(), "-".to_string(), selected.is_none())];
    options.extend(Month::ALL.into_iter().map(|m| {
        (
            m.number().to_string(),
            format!("{} ({})", m.label(), m.greek_label()),
            selected == Some(m),
        )
    }));
    options
}

fn category_inputs(view: &MemberFormView<'_>) -> String {
    let form = view.form;
    let month = |label: &str| {
        select(
            "month",
            label,
            &month_options(value(form, "month")),
            view.errors.get("month"),
        )
    };
    match view.category {
        Category::Members => [
            month("Joined month"),
            input(
                "subscription_year",
                "Subscription year",
                "number",
                value(form, "subscription_year"),
                view.errors.get("subscription_year"),
            ),
        ]
        .concat(),
        Category::Athletes => input(
            "federation_number",
            "Federation number (ΑΜ ΕΟΜ)",
            "text",
            value(form, "federation_number"),
            view.errors.get("federation_number"),
        ),
        Category::Students => [
            month("Period month"),
            format!(
                r#"<div class="pt-6">{}</div>"#,
                checkbox("university", "University student", value(form, "university") == "on")
            ),
        ]
        .concat(),
        Category::Interested => month("Interested since"),
    }
}

pub fn member_form_page(view: &MemberFormView<'_>) -> String {
    let form = view.form;
    let errors = view.errors;
    let (title, action) = match view.member_id {
        Some(id) => ("Edit person".to_string(), format!("/members/{}", id)),
        None => (format!("Add to {}", view.category.label()), "/members".to_string()),
    };

    let category_options: Vec<(String, String, bool)> = Category::ALL
        .into_iter()
        .map(|c| {
            (
                c.slug().to_string(),
                format!("{} ({})", c.label(), c.greek_label()),
                c == view.category,
            )
        })
        .collect();
    let category_select = if view.member_id.is_some() {
        format!(
            r#"{}<p class="text-xs text-gray-500 mt-1">Changing category drops details and custom fields that do not apply.</p>"#,
            select("category", "Category", &category_options, errors.get("category"))
        )
    } else {
        format!(
            r#"<div onchange="window.location='/members/new?category='+event.target.value">{}</div>"#,
            select("category", "Category", &category_options, errors.get("category"))
        )
    };

    let status_options: Vec<(String, String, bool)> = MemberStatus::ALL
        .into_iter()
        .map(|s| {
            (
                s.slug().to_string(),
                s.label().to_string(),
                MemberStatus::parse(value(form, "status")).unwrap_or(MemberStatus::Active) == s,
            )
        })
        .collect();

    let custom = if view.fields.is_empty() {
        String::new()
    } else {
        let inputs: String = view
            .fields
            .iter()
            .map(|f| {
                let name = format!("cf_{}", f.id);
                input(&name, &f.label, "text", value(form, &name), errors.get(&name))
            })
            .collect();
        card(
            "Custom fields",
            &format!(r#"<div class="grid grid-cols-1 md:grid-cols-2 gap-4">{inputs}</div>"#),
        )
    };

    let form_error = view.form_error.map_or(String::new(), |e| alert("error", e));
    let delete = view.member_id.map_or(String::new(), |id| {
        format!(
            r##"<form method="post" action="/members/{id}/delete" onsubmit="return confirm('Delete this person?')">
                {button}
            </form>"##,
            button = submit_button("Delete", "danger"),
        )
    });

    let content = format!(
        r##"{header}
        {form_error}
        <form method="post" action="{action}" class="space-y-6" id="member-form">
            {details}
            {custom}
        </form>
        <div class="flex items-center justify-between mt-6">
            <div class="flex gap-2">
                <button type="submit" form="member-form" class="bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">Save</button>
                <a href="/members?category={slug}" class="px-4 py-2 text-gray-500 hover:text-gray-700">Cancel</a>
            </div>
            {delete}
        </div>"##,
        header = page_header(&title, view.category.greek_label(), ""),
        details = card(
            "Details",
            &format!(
                r##"<div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                    {first}
                    {last}
                    {phone}
                    {email}
                    {category_select}
                    {status}
                    {year}
                    {category_inputs}
                </div>"##,
                first = input("first_name", "First name", "text", value(form, "first_name"), errors.get("first_name")),
                last = input("last_name", "Last name", "text", value(form, "last_name"), errors.get("last_name")),
                phone = input("phone", "Phone", "tel", value(form, "phone"), errors.get("phone")),
                email = input("email", "Email", "email", value(form, "email"), errors.get("email")),
                status = select("status", "Status", &status_options, errors.get("status")),
                year = input("year", "Year", "number", value(form, "year"), errors.get("year")),
                category_inputs = category_inputs(view),
            ),
        ),
        slug = view.category.slug(),
    );
    layout(view.club, &title, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clubhouse_core::CategoryDetails;
    use std::collections::{BTreeMap, BTreeSet};

    fn field(id: i32, label: &str, categories: &[Category]) -> CustomField {
        CustomField {
            id,
            key: label.to_lowercase(),
            label: label.into(),
            categories: categories.iter().copied().collect::<BTreeSet<_>>(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_members_page_shows_custom_columns_for_category() {
        let fields = vec![
            field(1, "ΑΜΚΑ", &[Category::Members]),
            field(2, "School", &[Category::Students]),
        ];
        let member = Member {
            id: 3,
            first_name: "Maria".into(),
            last_name: "<Papa>".into(),
            phone: None,
            email: None,
            status: MemberStatus::Active,
            year: Some(2020),
            details: CategoryDetails::empty(Category::Members),
            attributes: BTreeMap::from([(1, "0101".to_string())]),
            created_at: Utc::now(),
        };
        let query = FormData::from([("category".to_string(), "members".to_string())]);
        let filter = MemberFilter::for_category(Category::Members);
        let html = members_page(&MembersView {
            club: Some("Bridge Club"),
            members: std::slice::from_ref(&member),
            fields: &fields,
            counts: &CategoryCounts::default(),
            query: &query,
            filter: &filter,
            errors: &FieldErrors::default(),
            notice: Some("Member added"),
        });
        assert!(html.contains("ΑΜΚΑ"));
        assert!(!html.contains("School"));
        assert!(html.contains("Maria &lt;Papa&gt;"));
        assert!(html.contains("/export?scope=filtered&amp;category=members"));
        assert!(html.contains("Member added"));
    }

    #[test]
    fn test_member_form_page_renders_category_inputs_and_errors() {
        let mut errors = FieldErrors::default();
        errors.insert("email", "'x' is not an email address");
        let form = FormData::from([("email".to_string(), "x".to_string())]);
        let html = member_form_page(&MemberFormView {
            club: None,
            member_id: None,
            category: Category::Athletes,
            form: &form,
            fields: &[field(1, "ΑΜΚΑ", &[Category::Athletes])],
            errors: &errors,
            form_error: None,
        });
        assert!(html.contains("federation_number"));
        assert!(!html.contains("subscription_year"));
        assert!(html.contains("cf_1"));
        assert!(html.contains("&#39;x&#39; is not an email address"));
    }
}
