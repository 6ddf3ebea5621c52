//! Composition root.
//!
//! # Data Flow
//! ```text
//! register_module(M)
//!     → register M.imports() depth-first (each at most once)
//!     → root.create_named_child(M.name)
//!     → M.configure(child)
//!     → for each export: resolve in child, check root for a conflict
//!     → M.controllers(child)
//!     → bind every resolved export as a constant in root
//!     → record M under its name
//! ```
//!
//! # Design Decisions
//! - Registration takes `&mut self`, so module configuration never interleaves
//! - Exports are snapshots of the resolved value, not live providers
//! - Duplicate names are resolved by descriptor identity (`Arc` address)
//! - Any failure aborts composition; nothing is retried

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::di::module::{same_module, Module};
use crate::di::registry::{Registry, RegistryError};
use crate::di::BoxError;
use crate::http::controller::Controller;

/// Errors raised while composing modules.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A different module descriptor already uses this name.
    #[error("a different module named '{name}' is already registered")]
    DuplicateModuleName { name: String },

    /// A module imports itself, directly or transitively.
    #[error("module import cycle: {chain}")]
    ImportCycle { chain: String },

    /// A module exports an id it did not bind in its own registry.
    #[error("module '{module}' exports '{service}' but does not bind it")]
    ExportNotBound { module: String, service: String },

    /// The module's configure step failed.
    #[error("module '{module}' failed to configure: {source}")]
    Configure {
        module: String,
        #[source]
        source: BoxError,
    },

    /// The module could not build its controllers.
    #[error("module '{module}' failed to build controllers: {source}")]
    Controllers {
        module: String,
        #[source]
        source: BoxError,
    },

    /// Binding or resolving an export failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

struct RegisteredModule {
    module: Arc<dyn Module>,
    registry: Registry,
    controllers: Vec<Controller>,
}

/// Owns the root registry and every registered module's child registry.
pub struct ApplicationContainer {
    root: Registry,
    modules: Vec<RegisteredModule>,
    by_name: HashMap<String, usize>,
    in_progress: Vec<Arc<dyn Module>>,
}

impl ApplicationContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            root: Registry::new(),
            modules: Vec::new(),
            by_name: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// The root registry holding every exported service.
    pub fn root(&self) -> &Registry {
        &self.root
    }

    /// Register a module and, first, everything it imports.
    pub async fn register_module(&mut self, module: Arc<dyn Module>) -> Result<(), ContainerError> {
        self.register(module).await
    }

    // Boxed so imports can recurse.
    fn register(&mut self, module: Arc<dyn Module>) -> BoxFuture<'_, Result<(), ContainerError>> {
        Box::pin(async move {
            let name = module.name().to_string();

            if let Some(&index) = self.by_name.get(&name) {
                if same_module(&self.modules[index].module, &module) {
                    tracing::debug!(module = %name, "Module already registered, skipping");
                    return Ok(());
                }
                return Err(ContainerError::DuplicateModuleName { name });
            }

            if let Some(pending) = self.in_progress.iter().find(|m| m.name() == name) {
                if !same_module(pending, &module) {
                    return Err(ContainerError::DuplicateModuleName { name });
                }
                let mut chain: Vec<&str> = self.in_progress.iter().map(|m| m.name()).collect();
                chain.push(&name);
                return Err(ContainerError::ImportCycle {
                    chain: chain.join(" -> "),
                });
            }

            self.in_progress.push(Arc::clone(&module));
            let result = self.register_fresh(&name, &module).await;
            self.in_progress.pop();
            result
        })
    }

    async fn register_fresh(&mut self, name: &str, module: &Arc<dyn Module>) -> Result<(), ContainerError> {
        for import in module.imports() {
            self.register(import).await?;
        }

        let registry = self.root.create_named_child(name);
        module
            .configure(&registry)
            .await
            .map_err(|source| ContainerError::Configure {
                module: name.to_string(),
                source,
            })?;

        let exports = module.exports();
        let mut staged = Vec::with_capacity(exports.len());
        for key in &exports {
            if !registry.is_bound_locally(*key) {
                return Err(ContainerError::ExportNotBound {
                    module: name.to_string(),
                    service: key.to_string(),
                });
            }
            if self.root.is_bound_locally(*key) || staged.iter().any(|(staged_key, _)| staged_key == key) {
                return Err(RegistryError::DuplicateBinding {
                    id: *key,
                    scope: self.root.label().to_string(),
                }
                .into());
            }
            staged.push((*key, registry.resolve_key(*key).await?));
        }

        let controllers = module
            .controllers(&registry)
            .await
            .map_err(|source| ContainerError::Controllers {
                module: name.to_string(),
                source,
            })?;

        // Nothing reaches the root until the whole module succeeded.
        for (key, instance) in staged {
            self.root.bind_instance(key, instance)?;
        }

        tracing::info!(
            module = %name,
            bindings = registry.len(),
            exports = exports.len(),
            controllers = controllers.len(),
            "Module registered"
        );

        self.by_name.insert(name.to_string(), self.modules.len());
        self.modules.push(RegisteredModule {
            module: Arc::clone(module),
            registry,
            controllers,
        });
        Ok(())
    }

    /// The child registry of a registered module.
    pub fn module_registry(&self, name: &str) -> Option<&Registry> {
        self.by_name.get(name).map(|&index| &self.modules[index].registry)
    }

    /// Module names in registration order.
    pub fn registered_modules(&self) -> Vec<&str> {
        self.modules.iter().map(|entry| entry.module.name()).collect()
    }

    /// Every controller, in module registration order.
    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.modules.iter().flat_map(|entry| entry.controllers.iter())
    }

    /// Dispose modules in reverse registration order. Failures are logged.
    pub async fn dispose(&self) {
        for entry in self.modules.iter().rev() {
            let name = entry.module.name();
            match entry.module.dispose(&entry.registry).await {
                Ok(()) => tracing::debug!(module = %name, "Module disposed"),
                Err(e) => tracing::warn!(module = %name, error = %e, "Module dispose failed"),
            }
        }
    }
}

impl Default for ApplicationContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::identifier::{ServiceId, ServiceKey};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type ConfigureFn = Box<dyn Fn(&Registry) -> Result<(), BoxError> + Send + Sync>;

    /// Module whose behaviour is assembled per test.
    struct TestModule {
        name: String,
        configure: ConfigureFn,
        exports: Vec<ServiceKey>,
        imports: Vec<Arc<dyn Module>>,
        configured: AtomicUsize,
        disposed: Option<Arc<Mutex<Vec<String>>>>,
    }

    impl TestModule {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                configure: Box::new(|_| Ok(())),
                exports: Vec::new(),
                imports: Vec::new(),
                configured: AtomicUsize::new(0),
                disposed: None,
            }
        }

        fn configure_with(mut self, f: impl Fn(&Registry) -> Result<(), BoxError> + Send + Sync + 'static) -> Self {
            self.configure = Box::new(f);
            self
        }

        fn exporting(mut self, key: ServiceKey) -> Self {
            self.exports.push(key);
            self
        }

        fn importing(mut self, module: Arc<dyn Module>) -> Self {
            self.imports.push(module);
            self
        }

        fn recording_dispose(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
            self.disposed = Some(log);
            self
        }

        fn configured(&self) -> usize {
            self.configured.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Module for TestModule {
        fn name(&self) -> &str {
            &self.name
        }

        async fn configure(&self, registry: &Registry) -> Result<(), BoxError> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            (self.configure)(registry)
        }

        fn exports(&self) -> Vec<ServiceKey> {
            self.exports.clone()
        }

        fn imports(&self) -> Vec<Arc<dyn Module>> {
            self.imports.clone()
        }

        async fn dispose(&self, _registry: &Registry) -> Result<(), BoxError> {
            if let Some(log) = &self.disposed {
                log.lock().unwrap().push(self.name.clone());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn shared_import_is_configured_once() {
        let shared = Arc::new(TestModule::new("Shared"));
        let a = Arc::new(TestModule::new("A").importing(shared.clone()));
        let b = Arc::new(TestModule::new("B").importing(shared.clone()));

        let mut container = ApplicationContainer::new();
        container.register_module(a).await.unwrap();
        container.register_module(b).await.unwrap();

        assert_eq!(shared.configured(), 1);
        assert_eq!(container.registered_modules(), vec!["Shared", "A", "B"]);
    }

    #[tokio::test]
    async fn registering_same_descriptor_twice_is_a_no_op() {
        let module = Arc::new(TestModule::new("Users"));
        let mut container = ApplicationContainer::new();
        container.register_module(module.clone()).await.unwrap();
        container.register_module(module.clone()).await.unwrap();

        assert_eq!(module.configured(), 1);
        assert_eq!(container.registered_modules(), vec!["Users"]);
    }

    #[tokio::test]
    async fn different_descriptor_with_same_name_is_rejected() {
        let mut container = ApplicationContainer::new();
        container
            .register_module(Arc::new(TestModule::new("Users")))
            .await
            .unwrap();

        let impostor = Arc::new(TestModule::new("Users"));
        let err = container.register_module(impostor.clone()).await.unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateModuleName { ref name } if name == "Users"));
        assert_eq!(impostor.configured(), 0);
    }

    #[tokio::test]
    async fn imports_complete_before_importer_configures() {
        let user_repo: ServiceId<Arc<String>> = ServiceId::new("UserRepository");
        let summary: ServiceId<String> = ServiceId::new("Summary");

        let users = Arc::new(
            TestModule::new("Users")
                .configure_with(move |registry| {
                    registry.bind_constant(&user_repo, Arc::new("users-ready".to_string()))?;
                    Ok(())
                })
                .exporting(user_repo.key()),
        );
        let reports = Arc::new(
            TestModule::new("Reports")
                .importing(users.clone())
                .configure_with(move |registry| {
                    // The import's export must already be visible through the root.
                    assert!(registry.contains(user_repo.key()));
                    registry.bind_factory(&summary, move |scope| async move {
                        let repo = scope.resolve(&user_repo).await?;
                        Ok::<_, BoxError>(format!("summary of {repo}"))
                    })?;
                    Ok(())
                })
                .exporting(summary.key()),
        );

        let mut container = ApplicationContainer::new();
        container.register_module(reports).await.unwrap();

        assert_eq!(container.registered_modules(), vec!["Users", "Reports"]);
        assert_eq!(
            container.root().resolve(&summary).await.unwrap(),
            "summary of users-ready"
        );
    }

    #[tokio::test]
    async fn exports_are_snapshots() {
        let state = Arc::new(AtomicUsize::new(1));
        let value: ServiceId<usize> = ServiceId::new("Value");

        let source = Arc::clone(&state);
        let module = Arc::new(
            TestModule::new("Snapshot")
                .configure_with(move |registry| {
                    let source = Arc::clone(&source);
                    registry.bind_factory(&value, move |_| {
                        let source = Arc::clone(&source);
                        async move { Ok::<_, BoxError>(source.load(Ordering::SeqCst)) }
                    })?;
                    Ok(())
                })
                .exporting(value.key()),
        );

        let mut container = ApplicationContainer::new();
        container.register_module(module).await.unwrap();
        state.store(99, Ordering::SeqCst);

        assert_eq!(container.root().resolve(&value).await.unwrap(), 1);
        assert!(container.root().is_bound_locally(value.key()));
    }

    #[tokio::test]
    async fn export_must_be_bound_locally() {
        let missing: ServiceId<u8> = ServiceId::new("Missing");
        let module = Arc::new(TestModule::new("Broken").exporting(missing.key()));

        let mut container = ApplicationContainer::new();
        let err = container.register_module(module).await.unwrap_err();
        assert!(matches!(err, ContainerError::ExportNotBound { ref module, .. } if module == "Broken"));
        assert!(container.registered_modules().is_empty());
    }

    #[tokio::test]
    async fn two_modules_exporting_same_id_conflict_in_root() {
        let shared: ServiceId<u8> = ServiceId::new("Shared");
        let first = Arc::new(
            TestModule::new("First")
                .configure_with(move |r| Ok(r.bind_constant(&shared, 1)?))
                .exporting(shared.key()),
        );
        let second = Arc::new(
            TestModule::new("Second")
                .configure_with(move |r| Ok(r.bind_constant(&shared, 2)?))
                .exporting(shared.key()),
        );

        let mut container = ApplicationContainer::new();
        container.register_module(first).await.unwrap();
        let err = container.register_module(second).await.unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Registry(RegistryError::DuplicateBinding { .. })
        ));
    }

    #[tokio::test]
    async fn failed_export_leaves_no_partial_exports_in_root() {
        let shared: ServiceId<u8> = ServiceId::new("Shared");
        let fresh: ServiceId<u8> = ServiceId::new("Fresh");
        let first = Arc::new(
            TestModule::new("First")
                .configure_with(move |r| Ok(r.bind_constant(&shared, 1)?))
                .exporting(shared.key()),
        );
        let second = Arc::new(
            TestModule::new("Second")
                .configure_with(move |r| {
                    r.bind_constant(&fresh, 2)?;
                    Ok(r.bind_constant(&shared, 3)?)
                })
                .exporting(fresh.key())
                .exporting(shared.key()),
        );

        let mut container = ApplicationContainer::new();
        container.register_module(first).await.unwrap();
        assert!(container.register_module(second).await.is_err());

        assert!(!container.root().is_bound_locally(fresh.key()));
        assert_eq!(container.root().resolve(&shared).await.unwrap(), 1);
        assert_eq!(container.registered_modules(), vec!["First"]);
    }

    #[tokio::test]
    async fn failing_export_provider_leaves_root_untouched() {
        let good: ServiceId<u8> = ServiceId::new("Good");
        let broken: ServiceId<u8> = ServiceId::new("Broken");
        let module = Arc::new(
            TestModule::new("Half")
                .configure_with(move |r| {
                    r.bind_constant(&good, 1)?;
                    Ok(r.bind_factory(&broken, |_| async { Err::<u8, BoxError>("no backend".into()) })?)
                })
                .exporting(good.key())
                .exporting(broken.key()),
        );

        let mut container = ApplicationContainer::new();
        let err = container.register_module(module).await.unwrap_err();
        assert!(matches!(err, ContainerError::Registry(RegistryError::Provider { .. })));
        assert!(!container.root().is_bound_locally(good.key()));
    }

    #[tokio::test]
    async fn configure_failure_aborts_registration() {
        let module = Arc::new(TestModule::new("Faulty").configure_with(|_| Err("database unreachable".into())));

        let mut container = ApplicationContainer::new();
        let err = container.register_module(module).await.unwrap_err();
        assert!(matches!(err, ContainerError::Configure { ref module, .. } if module == "Faulty"));
        assert!(err.to_string().contains("database unreachable"));
        assert!(container.module_registry("Faulty").is_none());
    }

    #[tokio::test]
    async fn sibling_module_scopes_are_isolated() {
        let private: ServiceId<u8> = ServiceId::new("Private");
        let owner = Arc::new(TestModule::new("Owner").configure_with(move |r| Ok(r.bind_constant(&private, 7)?)));
        let other = Arc::new(TestModule::new("Other"));

        let mut container = ApplicationContainer::new();
        container.register_module(owner).await.unwrap();
        container.register_module(other).await.unwrap();

        let owner_scope = container.module_registry("Owner").unwrap();
        let other_scope = container.module_registry("Other").unwrap();
        assert_eq!(owner_scope.resolve(&private).await.unwrap(), 7);
        assert!(matches!(
            other_scope.resolve(&private).await,
            Err(RegistryError::UnresolvedIdentifier { .. })
        ));
        assert!(matches!(
            container.root().resolve(&private).await,
            Err(RegistryError::UnresolvedIdentifier { .. })
        ));
    }

    /// Module that imports whatever is placed in its slot, to build cycles.
    struct CyclicModule {
        name: &'static str,
        import: Mutex<Option<Arc<dyn Module>>>,
    }

    #[async_trait]
    impl Module for CyclicModule {
        fn name(&self) -> &str {
            self.name
        }

        async fn configure(&self, _registry: &Registry) -> Result<(), BoxError> {
            Ok(())
        }

        fn imports(&self) -> Vec<Arc<dyn Module>> {
            self.import.lock().unwrap().iter().cloned().collect()
        }
    }

    #[tokio::test]
    async fn import_cycle_is_detected() {
        let a = Arc::new(CyclicModule {
            name: "A",
            import: Mutex::new(None),
        });
        let b: Arc<dyn Module> = Arc::new(CyclicModule {
            name: "B",
            import: Mutex::new(Some(a.clone() as Arc<dyn Module>)),
        });
        *a.import.lock().unwrap() = Some(b);

        let mut container = ApplicationContainer::new();
        let err = container.register_module(a.clone()).await.unwrap_err();
        assert!(matches!(err, ContainerError::ImportCycle { ref chain } if chain == "A -> B -> A"));

        // Break the cycle so the Arcs can be freed.
        a.import.lock().unwrap().take();
    }

    #[tokio::test]
    async fn dispose_runs_in_reverse_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = Arc::new(TestModule::new("Base").recording_dispose(log.clone()));
        let top = Arc::new(
            TestModule::new("Top")
                .importing(base.clone())
                .recording_dispose(log.clone()),
        );

        let mut container = ApplicationContainer::new();
        container.register_module(top).await.unwrap();
        container.dispose().await;

        assert_eq!(*log.lock().unwrap(), vec!["Top".to_string(), "Base".to_string()]);
    }
}
