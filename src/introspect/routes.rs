//! Route collection.
//!
//! # Responsibilities
//! - Walk every controller's bindings, including nested sub-routers
//! - Build full paths (base + nested prefixes + relative path)
//! - Sort deterministically: path, then method precedence
//!
//! # Design Decisions
//! - Paths always start with exactly one `/` and never end with one,
//!   except the root path `/`; empty segments are dropped
//! - The sort is stable, so methods outside the precedence list keep
//!   their encounter order

use axum::http::Method;

use crate::http::controller::{Binding, Controller, Endpoint};

/// Fixed reporting order for well-known methods.
const METHOD_PRECEDENCE: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
];

/// One exposed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    pub path: String,
}

impl RouteInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// A binding resolved to its full path.
pub struct FlatBinding<'a> {
    pub method: &'a Method,
    pub path: String,
    pub(crate) endpoint: &'a Endpoint,
}

/// Join two path fragments into a normalized absolute path.
pub fn join_path(base: &str, relative: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(relative.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Normalize a single path.
pub fn normalize_path(path: &str) -> String {
    join_path("", path)
}

/// Flatten one controller's bindings in declaration order.
pub fn flatten(controller: &Controller) -> Vec<FlatBinding<'_>> {
    let mut flat = Vec::new();
    walk(&normalize_path(controller.base_path()), controller.bindings(), &mut flat);
    flat
}

fn walk<'a>(prefix: &str, bindings: &'a [Binding], flat: &mut Vec<FlatBinding<'a>>) {
    for binding in bindings {
        match binding {
            Binding::Route { method, path, endpoint } => flat.push(FlatBinding {
                method,
                path: join_path(prefix, path),
                endpoint,
            }),
            Binding::Nested { path, bindings } => walk(&join_path(prefix, path), bindings, flat),
        }
    }
}

fn method_rank(method: &Method) -> usize {
    METHOD_PRECEDENCE
        .iter()
        .position(|known| known == method)
        .unwrap_or(METHOD_PRECEDENCE.len())
}

/// Collect and sort every operation exposed by `controllers`.
pub fn collect<'a, I>(controllers: I) -> Vec<RouteInfo>
where
    I: IntoIterator<Item = &'a Controller>,
{
    let mut routes: Vec<RouteInfo> = controllers
        .into_iter()
        .flat_map(|controller| {
            flatten(controller)
                .into_iter()
                .map(|binding| RouteInfo::new(binding.method.clone(), binding.path))
        })
        .collect();

    routes.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then_with(|| method_rank(&a.method).cmp(&method_rank(&b.method)))
    });
    routes
}
