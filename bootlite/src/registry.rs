//! Registry of components loaded during one orchestration run.
//!
//! Append-only: entries are never removed while a run is in progress. The
//! registry is discarded and rebuilt on the next run.

use std::collections::HashMap;
use std::sync::Arc;

use bootlite_shared::errors::{BootError, BootResult};
use parking_lot::RwLock;

use crate::component::{ComponentRef, WidgetHandle};

/// How an entry came to be registered.
#[derive(Debug, Clone)]
pub enum EntryKind {
    /// Constructed from a module binding.
    Instance,
    /// Widget created and attached through the widget registry.
    Widget(WidgetHandle),
    /// No-op stand-in for an optional component that failed to load.
    Fallback,
}

/// A registered component.
#[derive(Clone)]
pub struct ComponentHandle {
    pub name: String,
    pub kind: EntryKind,
    pub instance: ComponentRef,
}

impl ComponentHandle {
    pub fn new(name: impl Into<String>, kind: EntryKind, instance: ComponentRef) -> Self {
        Self {
            name: name.into(),
            kind,
            instance,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, EntryKind::Fallback)
    }
}

impl std::fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Thread-safe registry of loaded components.
///
/// # Design
///
/// - **Shared ownership**: Cloneable via `Arc`, shared by loader, scheduler and orchestrator
/// - **Concurrent access**: RwLock allows multiple readers, single writer; never held across `.await`
/// - **Append-only**: registration of an existing name is an error
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, ComponentHandle>,
    order: Vec<String>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    ///
    /// # Errors
    ///
    /// Returns error if a component with this name is already registered.
    pub fn register(&self, handle: ComponentHandle) -> BootResult<()> {
        let mut inner = self.inner.write();

        if inner.entries.contains_key(&handle.name) {
            return Err(BootError::Internal(format!(
                "component {} already registered",
                handle.name
            )));
        }

        tracing::debug!(
            component = %handle.name,
            kind = ?handle.kind,
            "Registering component"
        );

        inner.order.push(handle.name.clone());
        inner.entries.insert(handle.name.clone(), handle);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<ComponentHandle> {
        self.inner.read().entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    /// The subset of `names` not yet registered, in the given order.
    pub fn missing<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        let inner = self.inner.read();
        names
            .iter()
            .filter(|name| !inner.entries.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// True when every name in `names` is registered.
    pub fn contains_all(&self, names: &[String]) -> bool {
        let inner = self.inner.read();
        names.iter().all(|name| inner.entries.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::FallbackComponent;

    fn handle(name: &str) -> ComponentHandle {
        ComponentHandle::new(name, EntryKind::Instance, Arc::new(FallbackComponent::new(name)))
    }

    #[test]
    fn test_register_and_get() {
        let registry = ComponentRegistry::new();
        registry.register(handle("event-bus")).unwrap();

        let entry = registry.get("event-bus").unwrap();
        assert_eq!(entry.name, "event-bus");
        assert!(!entry.is_fallback());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ComponentRegistry::new();
        registry.register(handle("event-bus")).unwrap();
        let result = registry.register(handle("event-bus"));

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("already registered")
        );
    }

    #[test]
    fn test_names_keep_registration_order() {
        let registry = ComponentRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(handle(name)).unwrap();
        }
        assert_eq!(registry.names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_and_contains_all() {
        let registry = ComponentRegistry::new();
        registry.register(handle("a")).unwrap();

        let wanted = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(registry.missing(&wanted), vec!["b", "c"]);
        assert!(!registry.contains_all(&wanted));
        assert!(registry.contains_all(&wanted[..1]));
        assert!(registry.contains_all(&[]));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ComponentRegistry::new();
        let other = registry.clone();
        other.register(handle("dock")).unwrap();
        assert!(registry.contains("dock"));
    }
}
