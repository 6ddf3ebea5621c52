//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Install signal handlers → compose modules → Server (Idle)
//!
//! Server (server.rs):
//!     start(port) → mount controllers → bind → Running → log route table
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (first one wins)
//!
//! Shutdown (shutdown.rs):
//!     Running → Draining → stop accepting → drain within grace → Stopped
//!     → dispose modules → ShutdownOutcome (exit code)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: compose first, listener last
//! - Ordered shutdown: stop accept, drain, dispose
//! - Shutdown has one timeout: forced stop after the grace period

pub mod server;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use server::{LifecycleError, Server};
pub use shutdown::{drain, CloseError, ListenerHandle, Shutdown, ShutdownListener, ShutdownOutcome};
pub use signals::{spawn_signal_listener, ShutdownSignal};
pub use startup::{bootstrap, bootstrap_with_shutdown, compose, StartupError};
pub use state::{LifecycleState, ServerState};
