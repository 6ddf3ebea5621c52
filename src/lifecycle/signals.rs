//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM (ctrl-c elsewhere)
//! - Forward each signal to the [`Shutdown`] notifier
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signals after the first are logged at debug and otherwise ignored

use std::fmt;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// The termination signals the server reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

fn forward(shutdown: &Shutdown, signal: ShutdownSignal) {
    if shutdown.trigger(signal) {
        tracing::info!(signal = %signal, "Shutdown signal received");
    } else {
        tracing::debug!(signal = %signal, "Shutdown already in progress, ignoring signal");
    }
}

/// Install the handlers and forward signals until the process exits.
#[cfg(unix)]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => ShutdownSignal::Interrupt,
                Some(()) = terminate.recv() => ShutdownSignal::Terminate,
                else => break,
            };
            forward(&shutdown, received);
        }
    }))
}

/// Install the handlers and forward signals until the process exits.
#[cfg(not(unix))]
pub fn spawn_signal_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            forward(&shutdown, ShutdownSignal::Interrupt);
        }
    }))
}
