//! Shutdown coordination.
//!
//! # Responsibilities
//! - Carry the first termination signal to whoever waits for it
//! - Own the running listener's stop trigger and close future
//! - Drain within the grace period and classify how it ended
//!
//! # Design Decisions
//! - One `watch` channel: late subscribers still see an earlier trigger
//! - The close future and the grace timer race inside a single
//!   `tokio::time::timeout`, so the loser is dropped and has no effect

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::{AbortHandle, JoinError, JoinHandle};

use crate::lifecycle::signals::ShutdownSignal;

/// Notifier for graceful shutdown.
///
/// Cloned into signal handlers; every clone triggers the same channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<ShutdownSignal>>>,
}

impl Shutdown {
    /// Create a new, untriggered notifier.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown notification.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener { rx: self.tx.subscribe() }
    }

    /// Record `signal` if nothing was recorded yet. Returns whether this
    /// call was the first.
    pub fn trigger(&self, signal: ShutdownSignal) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(signal);
            true
        })
    }

    /// The recorded signal, if any.
    pub fn signal(&self) -> Option<ShutdownSignal> {
        *self.tx.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.signal().is_some()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<Option<ShutdownSignal>>,
}

impl ShutdownListener {
    /// Wait for the first trigger. Returns immediately if it already happened.
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(signal) => *signal,
            Err(_) => None,
        }
    }
}

/// Errors reported by a listener while it closes.
#[derive(Debug, Error)]
pub enum CloseError {
    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("listener task failed: {0}")]
    Task(#[from] JoinError),
}

/// A bound listener as seen by the lifecycle manager.
pub struct ListenerHandle {
    local_addr: SocketAddr,
    stop: oneshot::Sender<()>,
    closed: BoxFuture<'static, Result<(), CloseError>>,
    abort: Option<AbortHandle>,
}

impl ListenerHandle {
    /// Wrap an arbitrary close future. Nothing is aborted on timeout.
    pub fn new<F>(local_addr: SocketAddr, stop: oneshot::Sender<()>, closed: F) -> Self
    where
        F: Future<Output = Result<(), CloseError>> + Send + 'static,
    {
        Self {
            local_addr,
            stop,
            closed: closed.boxed(),
            abort: None,
        }
    }

    /// Wrap a spawned serve task; it is aborted if the grace period runs out.
    pub fn from_task(
        local_addr: SocketAddr,
        stop: oneshot::Sender<()>,
        task: JoinHandle<std::io::Result<()>>,
    ) -> Self {
        let abort = task.abort_handle();
        let closed = async move {
            task.await??;
            Ok::<_, CloseError>(())
        };
        Self {
            abort: Some(abort),
            ..Self::new(local_addr, stop, closed)
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

/// How a shutdown sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The server was never started; nothing to drain.
    NotStarted,
    /// Every connection finished within the grace period.
    Clean,
    /// The listener reported an error while closing.
    CloseFailed(String),
    /// The grace period ran out first.
    Forced,
}

impl ShutdownOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownOutcome::NotStarted | ShutdownOutcome::Clean => 0,
            ShutdownOutcome::CloseFailed(_) | ShutdownOutcome::Forced => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownOutcome::NotStarted => "not_started",
            ShutdownOutcome::Clean => "clean",
            ShutdownOutcome::CloseFailed(_) => "close_failed",
            ShutdownOutcome::Forced => "forced",
        }
    }
}

impl fmt::Display for ShutdownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownOutcome::CloseFailed(reason) => write!(f, "close_failed ({reason})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Stop accepting, then wait up to `grace` for the listener to close.
pub async fn drain(handle: ListenerHandle, grace: Duration) -> ShutdownOutcome {
    let ListenerHandle {
        local_addr,
        stop,
        closed,
        abort,
    } = handle;

    // The receiver is gone if the serve task already exited.
    let _ = stop.send(());

    match tokio::time::timeout(grace, closed).await {
        Ok(Ok(())) => {
            tracing::info!(address = %local_addr, "Listener closed");
            ShutdownOutcome::Clean
        }
        Ok(Err(e)) => {
            tracing::error!(address = %local_addr, error = %e, "Listener failed while closing");
            ShutdownOutcome::CloseFailed(e.to_string())
        }
        Err(_) => {
            tracing::warn!(
                address = %local_addr,
                grace_ms = grace.as_millis() as u64,
                "Graceful shutdown timeout reached, forcing shutdown"
            );
            if let Some(abort) = abort {
                abort.abort();
            }
            ShutdownOutcome::Forced
        }
    }
}
