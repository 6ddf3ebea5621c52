//! Route introspection subsystem.
//!
//! # Data Flow
//! ```text
//! Registered controllers (module registration order)
//!     → routes.rs (walk bindings, join paths, sort)
//!     → Vec<RouteInfo> (method, full path)
//!     → report.rs (table + module list, logged once at startup)
//! ```
//!
//! # Design Decisions
//! - Pure: no I/O besides the startup log line
//! - Ordering is a reporting contract, not a routing contract

pub mod report;
pub mod routes;

pub use routes::{collect, join_path, normalize_path, RouteInfo};
