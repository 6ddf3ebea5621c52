//! Startup diagnostics rendering.

use crate::introspect::routes::RouteInfo;

/// Render routes as a plain-text table.
pub fn render_routes(routes: &[RouteInfo]) -> String {
    let method_width = routes
        .iter()
        .map(|route| route.method.as_str().len())
        .chain(std::iter::once("Method".len()))
        .max()
        .unwrap_or(0);
    let path_width = routes
        .iter()
        .map(|route| route.path.len())
        .chain(std::iter::once("Path".len()))
        .max()
        .unwrap_or(0);

    let border = format!("+-{}-+-{}-+", "-".repeat(method_width), "-".repeat(path_width));
    let mut table = vec![
        border.clone(),
        format!("| {:<method_width$} | {:<path_width$} |", "Method", "Path"),
        border.clone(),
    ];
    for route in routes {
        table.push(format!(
            "| {:<method_width$} | {:<path_width$} |",
            route.method.as_str(),
            route.path
        ));
    }
    table.push(border);
    table.join("\n")
}

/// Render module names as a bullet list.
pub fn render_modules(modules: &[&str]) -> String {
    if modules.is_empty() {
        return "No modules registered.".to_string();
    }
    modules
        .iter()
        .map(|name| format!("  - {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Log the route table and module list once at startup.
pub fn log_startup_report(routes: &[RouteInfo], modules: &[&str]) {
    tracing::info!(
        modules = modules.len(),
        "Registered modules:\n{}",
        render_modules(modules)
    );
    tracing::info!(routes = routes.len(), "Exposed routes:\n{}", render_routes(routes));
}
