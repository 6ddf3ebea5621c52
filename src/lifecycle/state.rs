//! Server state machine.
//!
//! ```text
//! Idle ──start──▶ Running ──signal──▶ Draining ──closed/forced──▶ Stopped
//!   └──────────────────signal──────────────────────────────────────▲
//! ```
//!
//! Transitions only move forward. Each is a compare-and-swap, so of two
//! concurrent callers exactly one wins.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

impl ServerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ServerState::Idle,
            1 => ServerState::Running,
            2 => ServerState::Draining,
            _ => ServerState::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::Idle => "idle",
            ServerState::Running => "running",
            ServerState::Draining => "draining",
            ServerState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of asking the state machine to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTransition {
    /// Never started: went straight to `Stopped`.
    FromIdle,
    /// Was running: now `Draining`, caller owns the drain.
    FromRunning,
    /// Another caller already began shutting down.
    AlreadyShuttingDown,
}

/// Atomic holder for [`ServerState`].
#[derive(Debug)]
pub struct LifecycleState {
    raw: AtomicU8,
}

impl LifecycleState {
    pub fn new() -> Self {
        Self {
            raw: AtomicU8::new(ServerState::Idle as u8),
        }
    }

    pub fn current(&self) -> ServerState {
        ServerState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// `Idle → Running`. Returns the state found when the swap failed.
    pub fn mark_running(&self) -> Result<(), ServerState> {
        self.swap(ServerState::Idle, ServerState::Running)
    }

    /// Claim the shutdown sequence.
    pub fn begin_shutdown(&self) -> ShutdownTransition {
        if self.swap(ServerState::Idle, ServerState::Stopped).is_ok() {
            return ShutdownTransition::FromIdle;
        }
        if self.swap(ServerState::Running, ServerState::Draining).is_ok() {
            return ShutdownTransition::FromRunning;
        }
        ShutdownTransition::AlreadyShuttingDown
    }

    /// `Draining → Stopped`.
    pub fn mark_stopped(&self) {
        let _ = self.swap(ServerState::Draining, ServerState::Stopped);
    }

    fn swap(&self, from: ServerState, to: ServerState) -> Result<(), ServerState> {
        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ServerState::from_u8)
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}
