//! Dependency wiring subsystem.
//!
//! # Data Flow
//! ```text
//! Module definitions
//!     → container.rs (composition root, import order, export snapshots)
//!     → registry.rs (one child scope per module, root scope for exports)
//!     → identifier.rs (typed ids: ServiceId<T> → resolved T)
//! ```
//!
//! # Design Decisions
//! - No reflection: every binding is an explicit call with a typed id
//! - Scopes form a tree; lookup walks towards the root, never sideways
//! - Singletons are cached per owning scope
//! - The container is an owned value passed to the server, not a global

pub mod container;
pub mod identifier;
pub mod module;
pub mod registry;

pub use container::{ApplicationContainer, ContainerError};
pub use identifier::{ServiceId, ServiceKey};
pub use module::Module;
pub use registry::{BindingKind, Registry, RegistryError};

/// Error type accepted from feature code (providers, configure, dispose).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
