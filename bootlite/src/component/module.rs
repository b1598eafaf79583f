//! Module resolution: locator → named bindings.

use super::{Arg, ComponentRef};
use async_trait::async_trait;
use bootlite_shared::errors::{BootError, BootResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Export name preferred when selecting a constructible binding.
pub const DEFAULT_EXPORT: &str = "default";

/// Builds a component instance from resolved constructor arguments.
pub trait ComponentFactory: Send + Sync {
    fn construct(&self, args: Vec<Arg>) -> BootResult<ComponentRef>;
}

/// Closure-backed factory.
pub struct FnFactory<F>(pub F);

impl<F> ComponentFactory for FnFactory<F>
where
    F: Fn(Vec<Arg>) -> BootResult<ComponentRef> + Send + Sync,
{
    fn construct(&self, args: Vec<Arg>) -> BootResult<ComponentRef> {
        (self.0)(args)
    }
}

/// One named export of a resolved module.
#[derive(Clone)]
pub enum Binding {
    Factory(Arc<dyn ComponentFactory>),
    Constant(Value),
}

impl Binding {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(Vec<Arg>) -> BootResult<ComponentRef> + Send + Sync + 'static,
    {
        Binding::Factory(Arc::new(FnFactory(f)))
    }

    pub fn is_constructible(&self) -> bool {
        matches!(self, Binding::Factory(_))
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Factory(_) => f.write_str("Factory(..)"),
            Binding::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
        }
    }
}

/// Named exports of a resolved module, in export order.
#[derive(Clone, Debug, Default)]
pub struct ModuleBindings {
    exports: Vec<(String, Binding)>,
}

impl ModuleBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module with a single default export.
    pub fn with_default(binding: Binding) -> Self {
        Self::new().export(DEFAULT_EXPORT, binding)
    }

    pub fn export(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.exports.push((name.into(), binding));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.exports
            .iter()
            .find(|(export, _)| export == name)
            .map(|(_, binding)| binding)
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Pick the binding to construct for `component`.
    ///
    /// Order: the default export, then an export named like the component,
    /// then the first export. The chosen binding may still be a constant,
    /// which the caller rejects.
    pub fn select(&self, component: &str) -> Option<(&str, &Binding)> {
        [DEFAULT_EXPORT, component]
            .iter()
            .find_map(|name| self.exports.iter().find(|(export, _)| export == name))
            .or_else(|| self.exports.first())
            .map(|(export, binding)| (export.as_str(), binding))
    }
}

/// Produces the bindings of a module given its locator.
///
/// No caching is assumed; the orchestrator memoizes per component name.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn resolve(&self, locator: &str) -> BootResult<ModuleBindings>;
}

/// Resolver over a fixed, in-process table of modules.
#[derive(Clone, Default)]
pub struct StaticModuleResolver {
    modules: HashMap<String, ModuleBindings>,
}

impl StaticModuleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, locator: impl Into<String>, bindings: ModuleBindings) -> Self {
        self.modules.insert(locator.into(), bindings);
        self
    }

    pub fn insert(&mut self, locator: impl Into<String>, bindings: ModuleBindings) {
        self.modules.insert(locator.into(), bindings);
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.modules.contains_key(locator)
    }
}

#[async_trait]
impl ModuleResolver for StaticModuleResolver {
    async fn resolve(&self, locator: &str) -> BootResult<ModuleBindings> {
        self.modules
            .get(locator)
            .cloned()
            .ok_or_else(|| BootError::resolution(locator, "module not found"))
    }
}
