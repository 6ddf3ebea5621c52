//! Startup orchestration.
//!
//! # Responsibilities
//! - Register every module with a fresh composition root, in order
//! - Hand the composed container to a [`Server`]
//!
//! # Design Decisions
//! - Fail fast: any composition error aborts before the listener binds
//! - Modules register sequentially, never concurrently

use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::config::{ConfigError, ServerConfig};
use crate::di::{ApplicationContainer, ContainerError, Module};
use crate::lifecycle::server::{LifecycleError, Server};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

/// Everything that can stop the process from reaching `Running`.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] TryInitError),

    #[error("metrics setup failed: {0}")]
    Metrics(#[from] BuildError),

    #[error("module composition failed: {0}")]
    Composition(#[from] ContainerError),

    #[error("signal handler setup failed: {0}")]
    Signals(#[source] std::io::Error),

    #[error("server failed to start: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Register `modules` in order with a new composition root.
pub async fn compose(modules: Vec<Arc<dyn Module>>) -> Result<ApplicationContainer, ContainerError> {
    let mut container = ApplicationContainer::new();
    for module in modules {
        container.register_module(module).await?;
    }

    let registered = container.registered_modules();
    metrics::record_modules(registered.len());
    tracing::info!(modules = ?registered, "Composition complete");
    Ok(container)
}

/// Compose `modules` and wrap them in an idle server.
pub async fn bootstrap(config: &ServerConfig, modules: Vec<Arc<dyn Module>>) -> Result<Server, StartupError> {
    bootstrap_with_shutdown(config, modules, Shutdown::new()).await
}

/// Like [`bootstrap`], with a notifier that may already be wired to
/// signal handlers before composition starts.
pub async fn bootstrap_with_shutdown(
    config: &ServerConfig,
    modules: Vec<Arc<dyn Module>>,
    shutdown: Shutdown,
) -> Result<Server, StartupError> {
    let container = compose(modules).await?;
    Ok(Server::with_shutdown(container, config.clone(), shutdown))
}
