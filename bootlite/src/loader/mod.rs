//! Component loading and instantiation.
//!
//! ## Flow
//!
//! ```text
//! load(spec)
//!   ├─ already registered?  → Cached (resolver not called)
//!   ├─ disabled?            → Skipped
//!   ├─ resolve module       (raced against timeoutMs)
//!   ├─ instantiate          widget path | instance path
//!   └─ register
//! ```
//!
//! Failures of required components are fatal and returned as
//! `BootError::RequiredComponent`. Failures of optional components are
//! logged and reported through [`LoadOutcome`]; with `fallbackGraceful` a
//! [`FallbackComponent`] is registered in their place.

mod args;
mod instance;
mod widget;

pub use args::{ExecutionContext, resolve_args};

use crate::component::{FallbackComponent, ModuleBindings, ModuleResolver, WidgetRegistry};
use crate::config::{ComponentSpec, StartupConfig};
use crate::metrics::{ComponentMetrics, LoadStatus};
use crate::registry::{ComponentHandle, ComponentRegistry, EntryKind};
use bootlite_shared::errors::{BootError, BootResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Result of one load attempt that did not abort the run.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Freshly instantiated and registered.
    Loaded(ComponentHandle),
    /// Already registered earlier in the run.
    Cached(ComponentHandle),
    /// Failed; a no-op stand-in was registered.
    Fallback {
        handle: ComponentHandle,
        error: BootError,
    },
    /// Failed; nothing was registered.
    Failed(BootError),
    /// Disabled in configuration.
    Skipped,
}

impl LoadOutcome {
    /// True when the component has a registry entry after this attempt.
    pub fn is_registered(&self) -> bool {
        matches!(
            self,
            LoadOutcome::Loaded(_) | LoadOutcome::Cached(_) | LoadOutcome::Fallback { .. }
        )
    }

    pub fn handle(&self) -> Option<&ComponentHandle> {
        match self {
            LoadOutcome::Loaded(handle)
            | LoadOutcome::Cached(handle)
            | LoadOutcome::Fallback { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BootError> {
        match self {
            LoadOutcome::Fallback { error, .. } | LoadOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Loads single components into the run's registry.
///
/// Cheap to clone; all clones share the registry.
#[derive(Clone)]
pub struct ComponentLoader {
    resolver: Arc<dyn ModuleResolver>,
    widgets: Arc<dyn WidgetRegistry>,
    registry: ComponentRegistry,
    config: Arc<StartupConfig>,
    context: Arc<ExecutionContext>,
}

impl ComponentLoader {
    pub fn new(
        resolver: Arc<dyn ModuleResolver>,
        widgets: Arc<dyn WidgetRegistry>,
        registry: ComponentRegistry,
        config: Arc<StartupConfig>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            resolver,
            widgets,
            registry,
            config,
            context,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &StartupConfig {
        &self.config
    }

    /// Load one component.
    ///
    /// Idempotent: a component already in the registry is returned as
    /// `Cached` without touching the module resolver.
    ///
    /// # Errors
    ///
    /// Returns `BootError::RequiredComponent` if the component is required
    /// and any step fails. Optional failures are reported in the outcome.
    pub async fn load(&self, spec: &ComponentSpec) -> BootResult<LoadOutcome> {
        if let Some(existing) = self.registry.get(&spec.name) {
            tracing::trace!(component = %spec.name, "Component already loaded");
            return Ok(LoadOutcome::Cached(existing));
        }

        if !spec.enabled {
            tracing::debug!(component = %spec.name, "Component disabled, skipping");
            return Ok(LoadOutcome::Skipped);
        }

        let start = Instant::now();
        tracing::debug!(
            component = %spec.name,
            path = %spec.path,
            widget = spec.is_widget,
            "Loading component"
        );

        match self.instantiate(spec).await {
            Ok(handle) => {
                let handle = self.register(handle);
                tracing::info!(
                    component = %spec.name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Component loaded"
                );
                Ok(LoadOutcome::Loaded(handle))
            }
            Err(e) => self.on_failure(spec, e, start.elapsed()),
        }
    }

    /// [`load`](Self::load), timed and folded into [`ComponentMetrics`].
    ///
    /// Fatal errors pass through unchanged.
    pub async fn attempt(&self, spec: &ComponentSpec) -> BootResult<ComponentMetrics> {
        let start = Instant::now();
        let outcome = self.load(spec).await?;
        let status = match &outcome {
            LoadOutcome::Loaded(_) => LoadStatus::Loaded,
            LoadOutcome::Cached(_) => LoadStatus::Cached,
            LoadOutcome::Fallback { .. } => LoadStatus::Fallback,
            LoadOutcome::Failed(_) => LoadStatus::Failed,
            LoadOutcome::Skipped => LoadStatus::Skipped,
        };
        Ok(ComponentMetrics {
            name: spec.name.clone(),
            status,
            duration_ms: start.elapsed().as_millis(),
            error: outcome.error().map(|e| e.to_string()),
        })
    }

    async fn instantiate(&self, spec: &ComponentSpec) -> BootResult<ComponentHandle> {
        let bindings = self.resolve_module(spec).await?;

        if spec.is_widget {
            widget::instantiate_widget(self, spec).await
        } else {
            instance::instantiate_instance(self, spec, &bindings).await
        }
    }

    /// Race the resolver against the configured timeout.
    async fn resolve_module(&self, spec: &ComponentSpec) -> BootResult<ModuleBindings> {
        let timeout = self.config.performance().timeout();

        match tokio::time::timeout(timeout, self.resolver.resolve(&spec.path)).await {
            Ok(Ok(bindings)) => Ok(bindings),
            Ok(Err(e)) => Err(BootError::resolution(&spec.name, e.to_string())),
            Err(_) => Err(BootError::Timeout {
                component: spec.name.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn on_failure(
        &self,
        spec: &ComponentSpec,
        error: BootError,
        elapsed: Duration,
    ) -> BootResult<LoadOutcome> {
        log_load_error(&spec.name, spec.required, elapsed, &error);

        if spec.required {
            return Err(BootError::required(&spec.name, error));
        }

        if spec.fallback_graceful {
            let handle = self.register(ComponentHandle::new(
                &spec.name,
                EntryKind::Fallback,
                Arc::new(FallbackComponent::new(&spec.name)),
            ));
            tracing::info!(component = %spec.name, "Registered fallback component");
            return Ok(LoadOutcome::Fallback { handle, error });
        }

        Ok(LoadOutcome::Failed(error))
    }

    /// Register, or return the entry that won a concurrent registration.
    fn register(&self, handle: ComponentHandle) -> ComponentHandle {
        match self.registry.register(handle.clone()) {
            Ok(()) => handle,
            Err(e) => {
                tracing::warn!(component = %handle.name, error = %e, "Keeping existing registration");
                self.registry.get(&handle.name).unwrap_or(handle)
            }
        }
    }
}

fn log_load_error(component: &str, required: bool, elapsed: Duration, e: &BootError) {
    let duration_ms = elapsed.as_millis() as u64;
    if required {
        tracing::error!(component, duration_ms, error = %e, "Required component failed to load");
    } else {
        tracing::warn!(component, duration_ms, error = %e, "Optional component failed to load");
    }
}
