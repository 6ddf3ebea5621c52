//! Feature module contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::di::identifier::ServiceKey;
use crate::di::registry::Registry;
use crate::di::BoxError;
use crate::http::controller::Controller;

/// A self-describing unit of feature wiring.
///
/// The composition root gives every module its own child [`Registry`]. A
/// module binds its services there in [`Module::configure`], lists the ids
/// other modules may use in [`Module::exports`], and names the modules it
/// depends on in [`Module::imports`]. Imports are registered before the
/// module itself.
///
/// Module identity is the `Arc` that holds it: registering the same `Arc`
/// twice is a no-op, registering a different module under an existing
/// name is an error.
#[async_trait]
pub trait Module: Send + Sync {
    /// Name, unique within one composition root.
    fn name(&self) -> &str;

    /// Populate the module's own registry.
    async fn configure(&self, registry: &Registry) -> Result<(), BoxError>;

    /// Ids copied by value into the root registry after configuration.
    fn exports(&self) -> Vec<ServiceKey> {
        Vec::new()
    }

    /// Modules that must be registered first.
    fn imports(&self) -> Vec<Arc<dyn Module>> {
        Vec::new()
    }

    /// Transport components contributed by this module, built from its
    /// configured registry.
    async fn controllers(&self, _registry: &Registry) -> Result<Vec<Controller>, BoxError> {
        Ok(Vec::new())
    }

    /// Release external resources owned by the module's services.
    async fn dispose(&self, _registry: &Registry) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Identity comparison of module descriptors.
pub(crate) fn same_module(a: &Arc<dyn Module>, b: &Arc<dyn Module>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
