//! Modular monolith service host.
//!
//! Feature modules are composed into one HTTP service: each module binds
//! its services into a scoped registry, exports some of them to the root,
//! and contributes controllers that the transport adapter mounts on a
//! single listener.
//!
//! # Architecture Overview
//!
//! ```text
//!   Modules ──▶ di::ApplicationContainer ──▶ registries populated
//!                        │
//!                        ▼
//!               controllers (http::Controller)
//!                        │
//!                        ▼
//!   lifecycle::Server ──start──▶ http::build_router ──▶ listener
//!         │                                   │
//!         │                     introspect::collect ──▶ route table log
//!         ▼
//!   Shutdown (SIGINT/SIGTERM) ──▶ drain within grace ──▶ dispose ──▶ exit code
//! ```

// Core runtime
pub mod di;
pub mod http;
pub mod introspect;
pub mod lifecycle;

// Cross-cutting concerns
pub mod config;
pub mod observability;

// Feature modules
pub mod contexts;

pub use config::AppConfig;
pub use di::{ApplicationContainer, Module, Registry, ServiceId};
pub use http::Controller;
pub use lifecycle::{Server, Shutdown, ShutdownOutcome};
