//! Argument binding for constructors and post-init calls.

use crate::component::Arg;
use crate::config::{ArgSpec, StartupConfig};
use crate::registry::ComponentRegistry;
use bootlite_shared::errors::{BootError, BootResult};
use std::collections::HashMap;

/// Named values available to `{"context": ...}` arguments.
///
/// Supplied by the host when building the orchestrator, e.g. the surface
/// handle or the event fabric.
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    entries: HashMap<String, Arg>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Arg>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.entries.get(name)
    }
}

/// Resolve declared arguments against the registry, document and context.
///
/// Pure apart from registry reads: the same inputs always yield the same
/// arguments, and nothing is mutated.
///
/// # Errors
///
/// Returns `BootError::Instantiation` naming `component` when a dependency
/// is not registered, a config path does not exist, or a context
/// identifier is unknown.
pub fn resolve_args(
    component: &str,
    specs: &[ArgSpec],
    registry: &ComponentRegistry,
    config: &StartupConfig,
    context: &ExecutionContext,
) -> BootResult<Vec<Arg>> {
    specs
        .iter()
        .map(|spec| match spec {
            ArgSpec::Value(value) => Ok(Arg::Value(value.clone())),
            ArgSpec::Dep(name) => registry
                .get(name)
                .map(|handle| Arg::Component(handle.instance))
                .ok_or_else(|| {
                    BootError::instantiation(
                        component,
                        format!("dependency '{}' is not loaded", name),
                    )
                }),
            ArgSpec::Config(path) => config.lookup(path).cloned().map(Arg::Value).ok_or_else(|| {
                BootError::instantiation(component, format!("config path '{}' not found", path))
            }),
            ArgSpec::Context(name) => context.get(name).cloned().ok_or_else(|| {
                BootError::instantiation(
                    component,
                    format!("unknown context identifier '{}'", name),
                )
            }),
        })
        .collect()
}
