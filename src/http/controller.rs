//! Transport components.
//!
//! A [`Controller`] is plain data: a base path and an ordered list of
//! bindings, built once when the owning module creates it. The transport
//! adapter mounts the bindings and the introspector lists them; neither
//! looks inside a handler.

use std::fmt;
use std::sync::Arc;

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{MethodFilter, MethodRouter};

/// Type-erased handler, materialized for a method filter at mount time.
pub type Endpoint = Arc<dyn Fn(MethodFilter) -> MethodRouter + Send + Sync>;

/// One entry of a controller's route list.
#[derive(Clone)]
pub enum Binding {
    /// A (method, relative path, handler) triple.
    Route {
        method: Method,
        path: String,
        endpoint: Endpoint,
    },
    /// A sub-router mounted under `path`.
    Nested { path: String, bindings: Vec<Binding> },
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Route { method, path, .. } => f
                .debug_struct("Route")
                .field("method", method)
                .field("path", path)
                .finish_non_exhaustive(),
            Binding::Nested { path, bindings } => f
                .debug_struct("Nested")
                .field("path", path)
                .field("bindings", bindings)
                .finish(),
        }
    }
}

/// A base path plus the operations reachable under it.
#[derive(Debug, Clone)]
pub struct Controller {
    base_path: String,
    bindings: Vec<Binding>,
}

impl Controller {
    /// Start an empty controller mounted at `base_path`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            bindings: Vec::new(),
        }
    }

    /// Add a stateless handler.
    pub fn route<H, T>(self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route_with_state(method, path, handler, ())
    }

    /// Add a handler that extracts `State<S>`.
    pub fn route_with_state<H, T, S>(mut self, method: Method, path: &str, handler: H, state: S) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let endpoint: Endpoint = Arc::new(move |filter: MethodFilter| -> MethodRouter {
            axum::routing::on(filter, handler.clone()).with_state::<()>(state.clone())
        });
        self.bindings.push(Binding::Route {
            method,
            path: path.to_string(),
            endpoint,
        });
        self
    }

    /// Mount another controller's bindings under its base path, relative
    /// to this controller.
    pub fn nest(mut self, group: Controller) -> Self {
        self.bindings.push(Binding::Nested {
            path: group.base_path,
            bindings: group.bindings,
        });
        self
    }

    /// Base path as given.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Bindings in declaration order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    #[test]
    fn bindings_keep_declaration_order() {
        let controller = Controller::new("/users")
            .route(Method::POST, "/", ok)
            .route(Method::GET, "/", ok)
            .nest(Controller::new("/admin").route(Method::DELETE, "/{id}", ok));

        assert_eq!(controller.base_path(), "/users");
        let summary: Vec<String> = controller
            .bindings()
            .iter()
            .map(|binding| match binding {
                Binding::Route { method, path, .. } => format!("{method} {path}"),
                Binding::Nested { path, bindings } => format!("nest {path} ({})", bindings.len()),
            })
            .collect();
        assert_eq!(summary, vec!["POST /", "GET /", "nest /admin (1)"]);
    }

    #[test]
    fn debug_output_omits_handlers() {
        let controller = Controller::new("/").route(Method::GET, "/health", ok);
        let rendered = format!("{controller:?}");
        assert!(rendered.contains("/health"));
        assert!(rendered.contains("GET"));
    }
}
