//! HTML templates for the dashboard.
//!
//! Uses a simple template approach with Tailwind CSS and Alpine.js.

/// Escape text for HTML bodies and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const HEAD: &str = r##"<meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <script src="https://cdn.tailwindcss.com"></script>
    <script>
        tailwind.config = {
            darkMode: 'class',
            theme: {
                extend: {
                    colors: {
                        primary: {
                            50: '#ecfdf5',
                            100: '#d1fae5',
                            200: '#a7f3d0',
                            300: '#6ee7b7',
                            400: '#34d399',
                            500: '#10b981',
                            600: '#059669',
                            700: '#047857',
                            800: '#065f46',
                            900: '#064e3b',
                        }
                    }
                }
            }
        }
    </script>
    <script defer src="https://unpkg.com/alpinejs@3.x.x/dist/cdn.min.js"></script>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
    <style>
        [x-cloak] { display: none !important; }
    </style>"##;

/// Base HTML layout wrapper.
pub fn layout(club_name: Option<&str>, title: &str, content: &str) -> String {
    let club = escape(club_name.unwrap_or("Clubhouse"));
    format!(
        r##"<!DOCTYPE html>
<html lang="en" x-data="{{
    darkMode: localStorage.getItem('darkMode') === 'true',
    sidebarOpen: true
}}" :class="{{ 'dark': darkMode }}">
<head>
    {HEAD}
    <title>{title} - {club}</title>
</head>
<body class="bg-gray-50 dark:bg-gray-900 min-h-screen">
    {nav}

    <div class="flex">
        {SIDEBAR}

        <main class="flex-1 p-6 lg:p-8">
            <div class="max-w-7xl mx-auto">
                {content}
            </div>
        </main>
    </div>
</body>
</html>"##,
        title = escape(title),
        nav = nav_template(&club),
        SIDEBAR = sidebar_template(),
    )
}

/// Standalone page for errors that leave nothing else to render.
pub fn error_page(title: &str, icon: &str, message: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    {HEAD}
    <title>{title}</title>
</head>
<body class="bg-gray-50 min-h-screen flex items-center justify-center">
    <div class="bg-white rounded-xl shadow-sm border border-gray-200 p-10 max-w-lg text-center">
        <i class="fas fa-{icon} text-5xl text-red-400 mb-4"></i>
        <h1 class="text-2xl font-bold text-gray-900 mb-2">{title}</h1>
        <p class="text-gray-600 mb-6">{message}</p>
        <a href="/" class="inline-flex items-center gap-2 bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
            <i class="fas fa-rotate-right"></i> Try again
        </a>
    </div>
</body>
</html>"##,
        title = escape(title),
        message = escape(message),
    )
}

fn nav_template(club: &str) -> String {
    format!(
        r##"<nav class="bg-primary-600 dark:bg-primary-900 text-white px-4 py-3 sticky top-0 z-50 shadow-lg">
        <div class="flex items-center justify-between">
            <div class="flex items-center gap-4">
                <button @click="sidebarOpen = !sidebarOpen" class="p-2 hover:bg-primary-700 rounded-lg lg:hidden">
                    <i class="fas fa-bars"></i>
                </button>
                <a href="/" class="flex items-center gap-2">
                    <i class="fas fa-diamond text-xl"></i>
                    <span class="font-semibold">{club}</span>
                </a>
            </div>
            <button @click="darkMode = !darkMode; localStorage.setItem('darkMode', darkMode)"
                    class="p-2 hover:bg-primary-700 rounded-lg">
                <i class="fas" :class="darkMode ? 'fa-sun' : 'fa-moon'"></i>
            </button>
        </div>
    </nav>"##
    )
}

fn sidebar_link(href: &str, icon: &str, label: &str) -> String {
    format!(
        r##"<a href="{href}" class="flex items-center gap-3 px-4 py-3 text-gray-700 dark:text-gray-200 hover:bg-primary-50 dark:hover:bg-primary-900/50 rounded-lg transition-colors">
                    <i class="fas fa-{icon} w-5"></i>
                    <span>{label}</span>
                </a>"##
    )
}

fn sidebar_heading(text: &str) -> String {
    format!(
        r##"<div class="pt-4 pb-2 px-4 text-xs font-semibold text-gray-400 dark:text-gray-500 uppercase tracking-wider">{text}</div>"##
    )
}

fn sidebar_template() -> String {
    let links = [
        sidebar_link("/", "home", "Home"),
        sidebar_heading("Members"),
        sidebar_link("/members", "users", "All"),
        sidebar_link("/members?category=members", "id-card", "Members"),
        sidebar_link("/members?category=athletes", "trophy", "Athletes"),
        sidebar_link("/members?category=students", "graduation-cap", "Students"),
        sidebar_link("/members?category=interested", "user-clock", "Interested"),
        sidebar_heading("Data"),
        sidebar_link("/import", "file-import", "Import"),
        sidebar_link("/export?scope=all", "file-export", "Export all"),
        sidebar_heading("Configuration"),
        sidebar_link("/fields", "list-check", "Custom fields"),
        sidebar_link("/settings", "cog", "Settings"),
    ]
    .concat();
    format!(
        r##"<aside class="w-64 bg-white dark:bg-gray-800 border-r border-gray-200 dark:border-gray-700 min-h-[calc(100vh-56px)] transition-all duration-300"
              :class="{{ '-ml-64': !sidebarOpen }}"
              x-cloak>
            <nav class="p-4 space-y-1">
                {links}
            </nav>
        </aside>"##
    )
}

/// Page heading with an optional subtitle and right-hand actions.
pub fn page_header(title: &str, subtitle: &str, actions: &str) -> String {
    format!(
        r##"<div class="flex items-center justify-between mb-6">
            <div>
                <h1 class="text-2xl font-bold text-gray-900 dark:text-white">{title}</h1>
                <p class="text-gray-600 dark:text-gray-400">{subtitle}</p>
            </div>
            <div class="flex items-center gap-2">{actions}</div>
        </div>"##,
        title = escape(title),
        subtitle = escape(subtitle),
    )
}

/// Card component.
pub fn card(title: &str, content: &str) -> String {
    format!(
        r##"<div class="bg-white dark:bg-gray-800 rounded-xl shadow-sm border border-gray-200 dark:border-gray-700 overflow-hidden">
            <div class="px-6 py-4 border-b border-gray-200 dark:border-gray-700">
                <h3 class="text-lg font-semibold text-gray-900 dark:text-white">{title}</h3>
            </div>
            <div class="p-6">
                {content}
            </div>
        </div>"##
    )
}

/// Stats card component.
pub fn stats_card(title: &str, value: &str, icon: &str, color: &str, href: &str) -> String {
    format!(
        r##"<a href="{href}" class="block bg-white dark:bg-gray-800 rounded-xl shadow-sm border border-gray-200 dark:border-gray-700 p-6 hover:border-{color}-300 transition-colors">
            <div class="flex items-center justify-between">
                <div>
                    <p class="text-sm text-gray-500 dark:text-gray-400">{title}</p>
                    <p class="text-2xl font-bold text-gray-900 dark:text-white mt-1">{value}</p>
                </div>
                <div class="w-12 h-12 rounded-full bg-{color}-100 dark:bg-{color}-900/30 flex items-center justify-center">
                    <i class="fas fa-{icon} text-{color}-500 text-xl"></i>
                </div>
            </div>
        </a>"##
    )
}

/// Link styled as a button.
pub fn link_button(text: &str, href: &str, icon: &str, variant: &str) -> String {
    format!(
        r##"<a href="{href}" class="{classes} inline-flex items-center gap-2 px-4 py-2 rounded-lg font-medium transition-colors"><i class="fas fa-{icon}"></i> {text}</a>"##,
        classes = variant_classes(variant),
    )
}

/// Submit button component.
pub fn submit_button(text: &str, variant: &str) -> String {
    format!(
        r##"<button type="submit" class="{classes} px-4 py-2 rounded-lg font-medium transition-colors disabled:opacity-50">{text}</button>"##,
        classes = variant_classes(variant),
    )
}

fn variant_classes(variant: &str) -> &'static str {
    match variant {
        "primary" => "bg-primary-600 hover:bg-primary-700 text-white",
        "secondary" => {
            "bg-gray-200 dark:bg-gray-700 hover:bg-gray-300 dark:hover:bg-gray-600 text-gray-700 dark:text-gray-200"
        }
        "danger" => "bg-red-600 hover:bg-red-700 text-white",
        _ => "bg-gray-200 hover:bg-gray-300 text-gray-700",
    }
}

fn field_error(error: Option<&str>) -> String {
    error.map_or(String::new(), |e| {
        format!(
            r#"<p class="text-sm text-red-600 dark:text-red-400">{}</p>"#,
            escape(e)
        )
    })
}

fn control_border(error: Option<&str>) -> &'static str {
    if error.is_some() {
        "border-red-500"
    } else {
        "border-gray-300 dark:border-gray-600"
    }
}

/// Input field component with an inline error slot.
pub fn input(name: &str, label: &str, input_type: &str, value: &str, error: Option<&str>) -> String {
    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700 dark:text-gray-300">{label}</label>
            <input type="{input_type}" name="{name}" id="{name}" value="{value}"
                   class="w-full px-4 py-2 border {border} rounded-lg bg-white dark:bg-gray-800 text-gray-900 dark:text-white focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
            {error}
        </div>"##,
        label = escape(label),
        value = escape(value),
        border = control_border(error),
        error = field_error(error),
    )
}

/// Select field component. Options are `(value, text, selected)`.
pub fn select(name: &str, label: &str, options: &[(String, String, bool)], error: Option<&str>) -> String {
    let options_html: String = options
        .iter()
        .map(|(value, text, selected)| {
            let (value, text) = (escape(value), escape(text));
            if *selected {
                format!(r#"<option value="{value}" selected>{text}</option>"#)
            } else {
                format!(r#"<option value="{value}">{text}</option>"#)
            }
        })
        .collect();

    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700 dark:text-gray-300">{label}</label>
            <select name="{name}" id="{name}"
                    class="w-full px-4 py-2 border {border} rounded-lg bg-white dark:bg-gray-800 text-gray-900 dark:text-white focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
                {options_html}
            </select>
            {error}
        </div>"##,
        label = escape(label),
        border = control_border(error),
        error = field_error(error),
    )
}

/// Checkbox component.
pub fn checkbox(name: &str, label: &str, checked: bool) -> String {
    let checked = if checked { " checked" } else { "" };
    format!(
        r##"<label class="inline-flex items-center gap-2 text-sm text-gray-700 dark:text-gray-300">
            <input type="checkbox" name="{name}" value="on" class="rounded border-gray-300 text-primary-600 focus:ring-primary-500"{checked}>
            {label}
        </label>"##,
        label = escape(label),
    )
}

/// Form-level alert. `kind` is `error`, `warning` or `success`.
pub fn alert(kind: &str, message: &str) -> String {
    let (color, icon) = match kind {
        "error" => ("red", "circle-exclamation"),
        "warning" => ("yellow", "triangle-exclamation"),
        _ => ("green", "circle-check"),
    };
    format!(
        r##"<div class="mb-4 flex items-center gap-3 p-4 rounded-lg bg-{color}-50 dark:bg-{color}-900/30 text-{color}-800 dark:text-{color}-200 border border-{color}-200 dark:border-{color}-800">
            <i class="fas fa-{icon}"></i>
            <span>{message}</span>
        </div>"##,
        message = escape(message),
    )
}

/// Badge component.
pub fn badge(text: &str, color: &str) -> String {
    format!(
        r##"<span class="inline-flex items-center px-2.5 py-0.5 rounded-full text-xs font-medium bg-{color}-100 dark:bg-{color}-900/30 text-{color}-800 dark:text-{color}-300">{text}</span>"##,
        text = escape(text),
    )
}

/// Table component. Cells are inserted as HTML.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let headers_html: String = headers
        .iter()
        .map(|h| format!(r#"<th class="px-6 py-3 text-left text-xs font-medium text-gray-500 dark:text-gray-400 uppercase tracking-wider">{}</th>"#, escape(h)))
        .collect();

    let rows_html: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!(r#"<td class="px-6 py-4 whitespace-nowrap text-sm text-gray-900 dark:text-gray-100">{cell}</td>"#))
                .collect();
            format!(r#"<tr class="hover:bg-gray-50 dark:hover:bg-gray-700/50">{cells}</tr>"#)
        })
        .collect();

    format!(
        r##"<div class="overflow-x-auto">
            <table class="min-w-full divide-y divide-gray-200 dark:divide-gray-700">
                <thead class="bg-gray-50 dark:bg-gray-800">
                    <tr>{headers_html}</tr>
                </thead>
                <tbody class="bg-white dark:bg-gray-900 divide-y divide-gray-200 dark:divide-gray-700">
                    {rows_html}
                </tbody>
            </table>
        </div>"##
    )
}

/// Empty state component.
pub fn empty_state(icon: &str, title: &str, description: &str, action: Option<(&str, &str)>) -> String {
    let action_html = action.map_or(String::new(), |(text, href)| {
        format!(r##"<a href="{href}" class="mt-4 inline-flex items-center gap-2 bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
            <i class="fas fa-plus"></i> {text}
        </a>"##)
    });

    format!(
        r##"<div class="text-center py-12">
            <i class="fas fa-{icon} text-4xl text-gray-400 dark:text-gray-600 mb-4"></i>
            <h3 class="text-lg font-medium text-gray-900 dark:text-white">{title}</h3>
            <p class="mt-1 text-gray-500 dark:text-gray-400">{description}</p>
            {action_html}
        </div>"##
    )
}

/// Small POST form holding a single delete button.
pub fn delete_button(action: &str, confirm: &str) -> String {
    format!(
        r##"<form method="post" action="{action}" class="inline" onsubmit="return confirm('{confirm}')">
            <button type="submit" class="text-red-600 hover:text-red-800 dark:text-red-400" title="Delete"><i class="fas fa-trash"></i></button>
        </form>"##,
        confirm = escape(confirm),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"O'Neil" & co</b>"#),
            "&lt;b&gt;&quot;O&#39;Neil&quot; &amp; co&lt;/b&gt;"
        );
        assert_eq!(escape("Παπαδοπούλου"), "Παπαδοπούλου");
    }

    #[test]
    fn test_input_shows_error() {
        let html = input("email", "Email", "email", "x", Some("not an email"));
        assert!(html.contains("border-red-500"));
        assert!(html.contains("not an email"));
        assert!(!input("email", "Email", "email", "x", None).contains("border-red-500"));
    }

    #[test]
    fn test_layout_escapes_club_name() {
        let html = layout(Some("<Bridge>"), "Home", "");
        assert!(html.contains("&lt;Bridge&gt;"));
        assert!(layout(None, "Home", "").contains("Clubhouse"));
    }
}
