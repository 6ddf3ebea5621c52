//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests currently being handled
//! - Report the count when draining starts
//!
//! # Design Decisions
//! - A guard decrements on drop, so panicking handlers are still counted out
//! - Counting is informational only; draining itself is done by the server

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// Shared counter of in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request. The returned guard releases it on drop.
    pub fn track(&self) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Requests currently in flight.
    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard for one in-flight request.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Middleware holding a guard for the duration of the request.
pub async fn track_in_flight(State(tracker): State<InFlightTracker>, request: Request, next: Next) -> Response {
    let _guard = tracker.track();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts_guards() {
        let tracker = InFlightTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let first = tracker.track();
        let second = tracker.clone().track();
        assert_eq!(tracker.active_count(), 2);

        drop(first);
        assert_eq!(tracker.active_count(), 1);

        drop(second);
        assert_eq!(tracker.active_count(), 0);
    }
}
