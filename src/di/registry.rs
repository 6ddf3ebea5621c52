//! Hierarchical service registry.
//!
//! # Responsibilities
//! - Bind constants and async factories to [`ServiceId`]s, one scope at a time
//! - Resolve ids locally first, then through the parent chain
//! - Cache factory results per owning scope (singleton-per-scope)
//!
//! # Design Decisions
//! - `Registry` is a cheap handle (`Arc` inside); clones share the scope
//! - Bindings live in a `DashMap` so insert-if-absent is atomic
//! - The singleton cache is a `tokio::sync::OnceCell`: concurrent first
//!   resolutions wait on a single provider invocation
//! - The cache is only filled on success, a failed provider can be retried

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::di::identifier::{ServiceId, ServiceKey};
use crate::di::BoxError;

/// A resolved value, type-erased.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

type FactoryFn = Box<dyn Fn(Registry) -> BoxFuture<'static, Result<Instance, BoxError>> + Send + Sync>;

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The id is already bound in this exact scope.
    #[error("service {id} is already bound in scope '{scope}'")]
    DuplicateBinding { id: ServiceKey, scope: String },

    /// Resolution walked to the root without finding a binding.
    #[error("service {id} is not bound in scope '{scope}' or any parent scope")]
    UnresolvedIdentifier { id: ServiceKey, scope: String },

    /// The bound value does not have the type the id promises.
    #[error("service {id} does not hold a value of type {expected}")]
    TypeMismatch { id: ServiceKey, expected: &'static str },

    /// The provider for the id failed.
    #[error("provider for service {id} failed: {source}")]
    Provider {
        id: ServiceKey,
        #[source]
        source: BoxError,
    },
}

enum Provider {
    Constant(Instance),
    Factory {
        factory: FactoryFn,
        cache: OnceCell<Instance>,
    },
}

struct Binding {
    key: ServiceKey,
    provider: Provider,
}

impl Binding {
    /// Produce the instance, invoking the factory at most once per scope.
    async fn instance(&self, owner: &Registry) -> Result<Instance, RegistryError> {
        match &self.provider {
            Provider::Constant(value) => Ok(Arc::clone(value)),
            Provider::Factory { factory, cache } => cache
                .get_or_try_init(|| async {
                    tracing::debug!(service = %self.key, scope = owner.label(), "Invoking provider");
                    factory(owner.clone())
                        .await
                        .map_err(|source| RegistryError::Provider { id: self.key, source })
                })
                .await
                .map(Arc::clone),
        }
    }

    fn kind(&self) -> BindingKind {
        match &self.provider {
            Provider::Constant(_) => BindingKind::Constant,
            Provider::Factory { cache, .. } if cache.initialized() => BindingKind::ResolvedFactory,
            Provider::Factory { .. } => BindingKind::Factory,
        }
    }
}

/// Diagnostic view of how an id is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A constant value (including exported snapshots).
    Constant,
    /// A factory that has not run yet.
    Factory,
    /// A factory whose singleton has been cached.
    ResolvedFactory,
}

struct Scope {
    label: String,
    bindings: DashMap<ServiceKey, Arc<Binding>>,
    parent: Option<Registry>,
}

/// A scope of service bindings with an optional parent.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Scope>,
}

impl Registry {
    /// Create a root scope.
    pub fn new() -> Self {
        Self::with_parent("root".to_string(), None)
    }

    fn with_parent(label: String, parent: Option<Registry>) -> Self {
        Self {
            inner: Arc::new(Scope {
                label,
                bindings: DashMap::new(),
                parent,
            }),
        }
    }

    /// Create a child scope whose parent is `self`.
    pub fn create_child(&self) -> Registry {
        self.create_named_child(format!("{}/child", self.label()))
    }

    /// Create a child scope with a diagnostic label.
    pub fn create_named_child(&self, label: impl Into<String>) -> Registry {
        Self::with_parent(label.into(), Some(self.clone()))
    }

    /// Diagnostic label of this scope.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Parent scope, if any.
    pub fn parent(&self) -> Option<&Registry> {
        self.inner.parent.as_ref()
    }

    /// Bind a constant value.
    pub fn bind_constant<T>(&self, id: &ServiceId<T>, value: T) -> Result<(), RegistryError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(id.key(), Provider::Constant(Arc::new(value)))
    }

    /// Bind an async factory. It runs on first resolution with the scope
    /// that owns the binding and its result is cached for that scope.
    ///
    /// A factory must not resolve its own id: the second resolution waits
    /// on the first and never completes.
    pub fn bind_factory<T, F, Fut>(&self, id: &ServiceId<T>, factory: F) -> Result<(), RegistryError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Registry) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        let factory: FactoryFn = Box::new(move |scope| {
            let pending = factory(scope);
            Box::pin(async move { pending.await.map(|value| Arc::new(value) as Instance) })
        });
        self.insert(
            id.key(),
            Provider::Factory {
                factory,
                cache: OnceCell::new(),
            },
        )
    }

    /// Bind an already resolved, type-erased instance as a constant.
    pub(crate) fn bind_instance(&self, key: ServiceKey, instance: Instance) -> Result<(), RegistryError> {
        self.insert(key, Provider::Constant(instance))
    }

    fn insert(&self, key: ServiceKey, provider: Provider) -> Result<(), RegistryError> {
        match self.inner.bindings.entry(key) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateBinding {
                id: key,
                scope: self.label().to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Binding { key, provider }));
                tracing::trace!(service = %key, scope = self.label(), "Service bound");
                Ok(())
            }
        }
    }

    /// Resolve an id from this scope or its ancestors.
    pub async fn resolve<T>(&self, id: &ServiceId<T>) -> Result<T, RegistryError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let instance = self.resolve_key(id.key()).await?;
        instance
            .downcast_ref::<T>()
            .cloned()
            .ok_or(RegistryError::TypeMismatch {
                id: id.key(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolve a type-erased key from this scope or its ancestors.
    pub(crate) async fn resolve_key(&self, key: ServiceKey) -> Result<Instance, RegistryError> {
        let mut scope = self.clone();
        loop {
            // Clone the binding out so the map guard is released before awaiting.
            let binding = scope.inner.bindings.get(&key).map(|entry| Arc::clone(entry.value()));
            if let Some(binding) = binding {
                return binding.instance(&scope).await;
            }
            match scope.inner.parent.clone() {
                Some(parent) => scope = parent,
                None => {
                    return Err(RegistryError::UnresolvedIdentifier {
                        id: key,
                        scope: self.label().to_string(),
                    })
                }
            }
        }
    }

    /// Whether the key is bound in this exact scope.
    pub fn is_bound_locally(&self, key: ServiceKey) -> bool {
        self.inner.bindings.contains_key(&key)
    }

    /// Whether the key is bound in this scope or any ancestor.
    pub fn contains(&self, key: ServiceKey) -> bool {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if current.is_bound_locally(key) {
                return true;
            }
            scope = current.parent();
        }
        false
    }

    /// Local bindings, ordered by key, for diagnostics.
    pub fn bindings(&self) -> Vec<(ServiceKey, BindingKind)> {
        let mut listed: Vec<_> = self
            .inner
            .bindings
            .iter()
            .map(|entry| (*entry.key(), entry.value().kind()))
            .collect();
        listed.sort_by_key(|(key, _)| *key);
        listed
    }

    /// Number of local bindings.
    pub fn len(&self) -> usize {
        self.inner.bindings.len()
    }

    /// Whether this scope has no local bindings.
    pub fn is_empty(&self) -> bool {
        self.inner.bindings.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("label", &self.inner.label)
            .field("bindings", &self.inner.bindings.len())
            .field("parent", &self.parent().map(Registry::label))
            .finish()
    }
}
