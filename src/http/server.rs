//! HTTP transport adapter.
//!
//! # Responsibilities
//! - Mount every controller binding onto one Axum router
//! - Reject bindings the router cannot serve, before anything is bound
//! - Wire up middleware (request ID, tracing, timeout, metrics, in-flight)
//! - Serve on a listener until told to stop
//!
//! # Design Decisions
//! - Bindings for the same path are merged into one `MethodRouter`
//! - Duplicate (method, path) pairs are an error, not a panic
//! - Captures are checked up front: Axum panics on paths its matcher
//!   cannot insert, so those are reported as [`TransportError`]s instead
//! - Unmatched requests get the JSON `not_found` envelope

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::middleware;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::controller::Controller;
use crate::http::inflight::{self, InFlightTracker};
use crate::http::response;
use crate::introspect::routes;
use crate::observability::metrics;

/// Errors raised while mounting controllers.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("method {method} on {path} cannot be routed")]
    UnsupportedMethod { method: Method, path: String },

    #[error("route {method} {path} is bound more than once")]
    DuplicateRoute { method: Method, path: String },

    #[error("route path {path} is invalid: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("route path {path} names capture {{{name}}} where {existing} already uses {{{existing_name}}}")]
    ConflictingCapture {
        path: String,
        name: String,
        existing: String,
        existing_name: String,
    },
}

/// Mount the bindings of `controllers` without any middleware.
pub fn mount<'a, I>(controllers: I) -> Result<Router, TransportError>
where
    I: IntoIterator<Item = &'a Controller>,
{
    let mut table: BTreeMap<String, MethodRouter> = BTreeMap::new();
    let mut seen: HashSet<(Method, String)> = HashSet::new();
    let mut captures = CaptureIndex::default();

    for controller in controllers {
        for binding in routes::flatten(controller) {
            check_path(&binding.path)?;
            captures.insert(&binding.path)?;

            let filter = MethodFilter::try_from(binding.method.clone()).map_err(|_| {
                TransportError::UnsupportedMethod {
                    method: binding.method.clone(),
                    path: binding.path.clone(),
                }
            })?;

            if !seen.insert((binding.method.clone(), binding.path.clone())) {
                return Err(TransportError::DuplicateRoute {
                    method: binding.method.clone(),
                    path: binding.path,
                });
            }

            let endpoint = (binding.endpoint)(filter);
            let merged = match table.remove(&binding.path) {
                Some(existing) => existing.merge(endpoint),
                None => endpoint,
            };
            table.insert(binding.path, merged);
        }
    }

    Ok(table
        .into_iter()
        .fold(Router::new(), |router, (path, methods)| router.route(&path, methods)))
}

fn check_path(path: &str) -> Result<(), TransportError> {
    let invalid = |reason| TransportError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let mut segments = path.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(invalid("captures are written as {name}"));
        }
        match Capture::parse(segment) {
            Some(capture) if capture.name.is_empty() => return Err(invalid("capture has no name")),
            Some(capture) if capture.catch_all && segments.peek().is_some() => {
                return Err(invalid("catch-all capture must be the last segment"))
            }
            Some(_) => {}
            None if segment.contains(['{', '}']) => {
                return Err(invalid("captures must span a whole segment"))
            }
            None => {}
        }
    }
    Ok(())
}

/// A `{name}` or `{*name}` path segment.
struct Capture<'a> {
    name: &'a str,
    catch_all: bool,
}

impl<'a> Capture<'a> {
    fn parse(segment: &'a str) -> Option<Self> {
        let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
        if inner.contains(['{', '}']) {
            return None;
        }
        Some(match inner.strip_prefix('*') {
            Some(name) => Capture { name, catch_all: true },
            None => Capture {
                name: inner,
                catch_all: false,
            },
        })
    }
}

/// Capture names by position, keyed on the capture-agnostic prefix
/// before them. Axum's matcher needs every route sharing a prefix to
/// use the same capture at the same position.
#[derive(Default)]
struct CaptureIndex {
    slots: HashMap<String, (String, String)>,
}

impl CaptureIndex {
    fn insert(&mut self, path: &str) -> Result<(), TransportError> {
        let mut shape = String::new();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let Some(capture) = Capture::parse(segment) else {
                shape.push('/');
                shape.push_str(segment);
                continue;
            };

            let written = segment.to_string();
            match self.slots.get(&shape) {
                Some((existing_segment, existing)) if *existing_segment != written => {
                    return Err(TransportError::ConflictingCapture {
                        path: path.to_string(),
                        name: capture.name.to_string(),
                        existing: existing.clone(),
                        existing_name: existing_segment.trim_matches(['{', '}']).to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    self.slots.insert(shape.clone(), (written, path.to_string()));
                }
            }
            shape.push_str(if capture.catch_all { "/{*}" } else { "/{}" });
        }
        Ok(())
    }
}

/// Build the application router with all middleware layers.
#[allow(deprecated)]
pub fn build_router<'a, I>(controllers: I, config: &ServerConfig, tracker: InFlightTracker) -> Result<Router, TransportError>
where
    I: IntoIterator<Item = &'a Controller>,
{
    let router = mount(controllers)?
        .fallback(response::not_found)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(middleware::from_fn_with_state(tracker, inflight::track_in_flight));

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(config.request_timeout())),
    ))
}

/// A fully layered router, ready to serve.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Serve until `stop` resolves, then wait for open connections to finish.
    pub async fn run<F>(self, listener: TcpListener, stop: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router).with_graceful_shutdown(stop).await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
