//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! Modules
//!     → controller.rs (base path + bindings, built at registration)
//!     → server.rs (mount bindings, layer middleware, serve)
//!     → inflight.rs (count requests while they run)
//!     → handler
//!     → response.rs (success / error envelopes)
//!     → Send to client
//! ```

pub mod controller;
pub mod inflight;
pub mod response;
pub mod server;

pub use controller::{Binding, Controller, Endpoint};
pub use inflight::InFlightTracker;
pub use response::{acknowledge, success, ApiError};
pub use server::{build_router, mount, HttpServer, TransportError};
