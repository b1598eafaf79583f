//! Instance path: construct a plain component from a module binding.

use super::{ComponentLoader, resolve_args};
use crate::component::{Binding, ModuleBindings};
use crate::config::ComponentSpec;
use crate::registry::{ComponentHandle, EntryKind};
use bootlite_shared::errors::{BootError, BootResult};
use std::sync::Arc;

/// Select a constructible binding, construct it, and run post-init.
///
/// Post-init is awaited when `awaitInit` is set; otherwise it runs on a
/// detached task and its failure is only logged.
pub(super) async fn instantiate_instance(
    loader: &ComponentLoader,
    spec: &ComponentSpec,
    bindings: &ModuleBindings,
) -> BootResult<ComponentHandle> {
    let (export, binding) = bindings
        .select(&spec.name)
        .ok_or_else(|| BootError::instantiation(&spec.name, "module has no exports"))?;

    let factory = match binding {
        Binding::Factory(factory) => Arc::clone(factory),
        Binding::Constant(_) => {
            return Err(BootError::instantiation(
                &spec.name,
                format!("export '{}' is not constructible", export),
            ));
        }
    };

    let args = resolve_args(
        &spec.name,
        &spec.constructor_args,
        loader.registry(),
        loader.config(),
        &loader.context,
    )?;

    tracing::trace!(component = %spec.name, export, args = args.len(), "Constructing component");

    let instance = factory
        .construct(args)
        .map_err(|e| BootError::instantiation(&spec.name, e.to_string()))?;

    if let Some(method) = spec.init_method.as_deref() {
        let init_args = resolve_args(
            &spec.name,
            &spec.init_args,
            loader.registry(),
            loader.config(),
            &loader.context,
        )?;

        if spec.await_init {
            instance
                .invoke(method, init_args)
                .await
                .map_err(|e| {
                    BootError::instantiation(&spec.name, format!("{}() failed: {}", method, e))
                })?;
        } else {
            let instance = Arc::clone(&instance);
            let component = spec.name.clone();
            let method = method.to_string();
            tokio::spawn(async move {
                if let Err(e) = instance.invoke(&method, init_args).await {
                    tracing::warn!(component = %component, method = %method, error = %e, "Detached post-init failed");
                }
            });
        }
    }

    Ok(ComponentHandle::new(&spec.name, EntryKind::Instance, instance))
}
