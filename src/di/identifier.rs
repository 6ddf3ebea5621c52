//! Typed service identifiers.
//!
//! A [`ServiceId<T>`] names one resolvable capability whose resolved value has
//! type `T` (usually an `Arc<dyn Trait>` or `Arc<Concrete>`). Identity is a
//! process-unique numeric key, never the diagnostic name, so two ids created
//! with the same name are still distinct.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key allocator. Relaxed ordering is enough, only uniqueness matters.
static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Type-erased identity of a [`ServiceId`].
///
/// Used where the value type is not known statically, e.g. module exports.
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey {
    id: u64,
    name: &'static str,
}

impl ServiceKey {
    /// Diagnostic name given at creation.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw key value.
    pub fn as_u64(&self) -> u64 {
        self.id
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ServiceKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Identifier of a service resolving to a value of type `T`.
///
/// Copying an id keeps its identity; creating a new one with
/// [`ServiceId::new`] always yields a fresh identity.
pub struct ServiceId<T> {
    key: ServiceKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceId<T> {
    /// Allocate a new identifier.
    pub fn new(name: &'static str) -> Self {
        Self {
            key: ServiceKey {
                id: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
                name,
            },
            _marker: PhantomData,
        }
    }

    /// The type-erased key of this id.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Diagnostic name.
    pub fn name(&self) -> &'static str {
        self.key.name
    }
}

impl<T> Clone for ServiceId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceId<T> {}

impl<T> PartialEq for ServiceId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for ServiceId<T> {}

impl<T> Hash for ServiceId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for ServiceId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceId")
            .field("key", &self.key)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for ServiceId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

impl<T> From<ServiceId<T>> for ServiceKey {
    fn from(id: ServiceId<T>) -> Self {
        id.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_yields_distinct_ids() {
        let a: ServiceId<u32> = ServiceId::new("Counter");
        let b: ServiceId<u32> = ServiceId::new("Counter");
        assert_ne!(a, b);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn copies_keep_identity() {
        let a: ServiceId<String> = ServiceId::new("Greeting");
        let b = a;
        assert_eq!(a, b);
        assert_eq!(ServiceKey::from(b), a.key());
    }

    #[test]
    fn display_includes_name_and_key() {
        let id: ServiceId<()> = ServiceId::new("Clock");
        let rendered = id.to_string();
        assert!(rendered.starts_with("Clock#"));
        assert_eq!(rendered, format!("Clock#{}", id.key().as_u64()));
    }
}
