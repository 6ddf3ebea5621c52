//! Lifecycle manager.
//!
//! # Responsibilities
//! - Mount the container's controllers and bind the listener
//! - Log the route table and module list once the server is up
//! - Run the shutdown sequence exactly once and report its outcome
//!
//! # Design Decisions
//! - Shutdown never fails: every error becomes a [`ShutdownOutcome`]
//! - The process exit belongs to the entry point, not to this type

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::di::ApplicationContainer;
use crate::http::{self, HttpServer, InFlightTracker, TransportError};
use crate::introspect::{self, report, RouteInfo};
use crate::lifecycle::shutdown::{self, ListenerHandle, Shutdown, ShutdownOutcome};
use crate::lifecycle::state::{LifecycleState, ServerState, ShutdownTransition};
use crate::observability::metrics;

/// Errors raised by [`Server::start`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("server cannot start while {0}")]
    AlreadyStarted(ServerState),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("route table rejected: {0}")]
    Transport(#[from] TransportError),

    /// A termination signal was recorded before the listener went live.
    #[error("shutdown requested before the server started")]
    ShutdownRequested,
}

/// Owns the composed application and its listener.
pub struct Server {
    container: ApplicationContainer,
    config: ServerConfig,
    state: Arc<LifecycleState>,
    shutdown: Shutdown,
    tracker: InFlightTracker,
    listener: Option<ListenerHandle>,
    outcome: Option<ShutdownOutcome>,
}

impl Server {
    pub fn new(container: ApplicationContainer, config: ServerConfig) -> Self {
        Self::with_shutdown(container, config, Shutdown::new())
    }

    /// Build a server that reacts to an existing notifier, so signals
    /// received during composition are not lost.
    pub fn with_shutdown(container: ApplicationContainer, config: ServerConfig, shutdown: Shutdown) -> Self {
        Self {
            container,
            config,
            state: Arc::new(LifecycleState::new()),
            shutdown,
            tracker: InFlightTracker::new(),
            listener: None,
            outcome: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state.current()
    }

    /// Notifier that ends [`Server::run`]. Clone it into signal handlers.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn container(&self) -> &ApplicationContainer {
        &self.container
    }

    /// Requests currently being handled.
    pub fn in_flight(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    /// Every operation exposed by the registered modules.
    pub fn routes(&self) -> Vec<RouteInfo> {
        introspect::collect(self.container.controllers())
    }

    /// Mount every controller, bind `host:port` and start serving.
    ///
    /// Port 0 binds an ephemeral port; the bound address is returned.
    /// Fails with [`LifecycleError::ShutdownRequested`] once the notifier
    /// has fired; the server stays `Idle` and [`Server::stop`] reports
    /// [`ShutdownOutcome::NotStarted`].
    pub async fn start(&mut self, port: u16) -> Result<SocketAddr, LifecycleError> {
        let current = self.state.current();
        if current != ServerState::Idle {
            return Err(LifecycleError::AlreadyStarted(current));
        }
        self.ensure_not_shutting_down()?;

        let router = http::build_router(self.container.controllers(), &self.config, self.tracker.clone())?;

        let addr = format!("{}:{}", self.config.host, port);
        let listener = TcpListener::bind((self.config.host.as_str(), port))
            .await
            .map_err(|source| LifecycleError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| LifecycleError::Bind { addr, source })?;

        // Binding may suspend long enough for a signal to arrive.
        self.ensure_not_shutting_down()?;
        self.state.mark_running().map_err(LifecycleError::AlreadyStarted)?;

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(HttpServer::new(router).run(listener, async move {
            let _ = stopped.await;
        }));
        self.listener = Some(ListenerHandle::from_task(local_addr, stop, task));

        report::log_startup_report(&self.routes(), &self.container.registered_modules());
        tracing::info!(address = %local_addr, "Server listening");
        Ok(local_addr)
    }

    fn ensure_not_shutting_down(&self) -> Result<(), LifecycleError> {
        match self.shutdown.signal() {
            Some(signal) => {
                tracing::info!(signal = %signal, "Shutdown requested before start, not binding");
                Err(LifecycleError::ShutdownRequested)
            }
            None => Ok(()),
        }
    }

    /// Run the shutdown sequence. Later calls return the first outcome.
    pub async fn stop(&mut self) -> ShutdownOutcome {
        if let Some(outcome) = &self.outcome {
            tracing::debug!(outcome = %outcome, "Shutdown already completed");
            return outcome.clone();
        }

        let outcome = match self.state.begin_shutdown() {
            ShutdownTransition::FromIdle => {
                tracing::info!("Shutdown requested before start, nothing to drain");
                ShutdownOutcome::NotStarted
            }
            ShutdownTransition::FromRunning => {
                let grace = self.config.grace_period();
                tracing::info!(
                    signal = ?self.shutdown.signal(),
                    in_flight = self.tracker.active_count(),
                    grace_ms = grace.as_millis() as u64,
                    "Starting graceful shutdown"
                );
                let outcome = match self.listener.take() {
                    Some(handle) => shutdown::drain(handle, grace).await,
                    None => ShutdownOutcome::Clean,
                };
                self.state.mark_stopped();
                outcome
            }
            ShutdownTransition::AlreadyShuttingDown => {
                // A previous stop was cancelled mid-drain.
                tracing::warn!(state = %self.state.current(), "Shutdown interrupted, forcing stop");
                self.listener = None;
                self.state.mark_stopped();
                ShutdownOutcome::Forced
            }
        };

        self.container.dispose().await;
        metrics::record_shutdown(outcome.as_str());
        tracing::info!(outcome = %outcome, exit_code = outcome.exit_code(), "Shutdown complete");

        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Wait for the shutdown notification, then stop.
    pub async fn run(mut self) -> ShutdownOutcome {
        let mut listener = self.shutdown.subscribe();
        listener.recv().await;
        self.stop().await
    }
}
