//! Widget path: instantiate through the widget registry and attach.

use super::ComponentLoader;
use crate::component::{Arg, Mount, WidgetHandle};
use crate::config::{ComponentSpec, MountPoint};
use crate::registry::{ComponentHandle, EntryKind};
use bootlite_shared::errors::{BootError, BootResult};
use std::sync::Arc;

/// Create, attach and optionally connect a widget component.
///
/// Steps:
/// 1. Wait until the widget type is instantiable
/// 2. Create the instance, assign id and attributes
/// 3. Attach it to its mount point
/// 4. Invoke `connectMethod` on `connectTo`, passing the new widget
pub(super) async fn instantiate_widget(
    loader: &ComponentLoader,
    spec: &ComponentSpec,
) -> BootResult<ComponentHandle> {
    let widget_config = spec.widget_config.clone().unwrap_or_default();
    let type_name = widget_config
        .type_name
        .clone()
        .unwrap_or_else(|| spec.name.clone());

    loader
        .widgets
        .await_type(&type_name)
        .await
        .map_err(|e| BootError::instantiation(&spec.name, e.to_string()))?;

    let instance = loader
        .widgets
        .instantiate(&type_name)
        .map_err(|e| BootError::instantiation(&spec.name, e.to_string()))?;

    let handle = WidgetHandle {
        id: widget_config.id.clone().unwrap_or_else(|| spec.name.clone()),
        type_name,
        attributes: widget_config.attributes.clone(),
        instance: Arc::clone(&instance),
    };

    let mount = match &widget_config.append_to {
        MountPoint::Surface => Mount::Surface,
        MountPoint::Container(owner) => {
            let entry = loader.registry().get(owner).ok_or_else(|| {
                BootError::instantiation(
                    &spec.name,
                    format!("mount target '{}' is not loaded", owner),
                )
            })?;
            Mount::Container {
                owner: owner.clone(),
                component: entry.instance,
            }
        }
    };

    loader
        .widgets
        .attach(&handle, &mount)
        .map_err(|e| BootError::instantiation(&spec.name, e.to_string()))?;

    tracing::debug!(
        component = %spec.name,
        widget_id = %handle.id,
        mount = %widget_config.append_to,
        "Widget attached"
    );

    if let (Some(target), Some(method)) = (
        widget_config.connect_to.as_deref(),
        widget_config.connect_method.as_deref(),
    ) {
        let entry = loader.registry().get(target).ok_or_else(|| {
            BootError::instantiation(
                &spec.name,
                format!("connect target '{}' is not loaded", target),
            )
        })?;

        entry
            .instance
            .invoke(method, vec![Arg::Component(Arc::clone(&instance))])
            .await
            .map_err(|e| {
                BootError::instantiation(
                    &spec.name,
                    format!("{}.{}() failed: {}", target, method, e),
                )
            })?;

        tracing::debug!(component = %spec.name, connect_to = target, method, "Widget connected");
    }

    Ok(ComponentHandle::new(
        &spec.name,
        EntryKind::Widget(handle),
        instance,
    ))
}

#[cfg(test)]
mod tests {
    use crate::component::{ComponentRef, FallbackComponent};
    use crate::config::{ComponentSpec, StartupConfig, WidgetConfig};
    use crate::loader::{ComponentLoader, ExecutionContext, LoadOutcome};
    use crate::registry::{ComponentHandle, ComponentRegistry, EntryKind};
    use crate::testing::{MockResolver, RecordingComponent, RecordingWidgets};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn widget_spec(name: &str, widget_config: WidgetConfig) -> ComponentSpec {
        let mut spec = ComponentSpec::new(name, format!("widgets/{}", name));
        spec.is_widget = true;
        spec.widget_config = Some(widget_config);
        spec
    }

    fn loader(widgets: Arc<RecordingWidgets>, registry: ComponentRegistry) -> ComponentLoader {
        ComponentLoader::new(
            Arc::new(MockResolver::new()),
            widgets,
            registry,
            Arc::new(StartupConfig::from_json(r#"{"startup":{"phases":[]}}"#).unwrap()),
            Arc::new(ExecutionContext::new()),
        )
    }

    #[tokio::test]
    async fn test_widget_attached_to_surface() {
        let widgets = Arc::new(RecordingWidgets::new());
        let loader = loader(Arc::clone(&widgets), ComponentRegistry::new());

        let mut attributes = BTreeMap::new();
        attributes.insert("format".to_string(), "24h".to_string());
        let spec = widget_spec(
            "clock",
            WidgetConfig {
                type_name: Some("clock-widget".into()),
                attributes,
                ..Default::default()
            },
        );

        let outcome = loader.load(&spec).await.unwrap();

        let handle = outcome.handle().unwrap();
        match &handle.kind {
            EntryKind::Widget(widget) => {
                assert_eq!(widget.id, "clock");
                assert_eq!(widget.type_name, "clock-widget");
                assert_eq!(widget.attributes.get("format").map(String::as_str), Some("24h"));
            }
            other => panic!("expected widget entry, got {:?}", other),
        }
        assert_eq!(
            widgets.events(),
            vec![
                "await:clock-widget",
                "instantiate:clock-widget",
                "attach:clock@surface",
            ]
        );
    }

    #[tokio::test]
    async fn test_widget_attached_to_container_and_connected() {
        let widgets = Arc::new(RecordingWidgets::new());
        let registry = ComponentRegistry::new();
        let menu_bar = Arc::new(RecordingComponent::new("menu-bar"));
        registry
            .register(ComponentHandle::new(
                "menu-bar",
                EntryKind::Instance,
                Arc::clone(&menu_bar) as ComponentRef,
            ))
            .unwrap();
        registry
            .register(ComponentHandle::new(
                "desktop",
                EntryKind::Instance,
                Arc::new(FallbackComponent::new("desktop")),
            ))
            .unwrap();
        let loader = loader(Arc::clone(&widgets), registry);

        let spec = widget_spec(
            "clock",
            WidgetConfig {
                id: Some("main-clock".into()),
                append_to: "desktop".to_string().into(),
                connect_to: Some("menu-bar".into()),
                connect_method: Some("addItem".into()),
                ..Default::default()
            },
        );

        loader.load(&spec).await.unwrap();

        assert_eq!(
            widgets.events().last().map(String::as_str),
            Some("attach:main-clock@desktop.container")
        );
        assert_eq!(menu_bar.calls(), vec!["addItem(<component>)"]);
    }

    #[tokio::test]
    async fn test_unavailable_widget_type_fails() {
        let widgets = Arc::new(RecordingWidgets::new().unavailable("clock"));
        let loader = loader(Arc::clone(&widgets), ComponentRegistry::new());
        let spec = widget_spec("clock", WidgetConfig::default());

        let outcome = loader.load(&spec).await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(!loader.registry().contains("clock"));
    }

    #[tokio::test]
    async fn test_missing_container_fails() {
        let widgets = Arc::new(RecordingWidgets::new());
        let loader = loader(Arc::clone(&widgets), ComponentRegistry::new());
        let spec = widget_spec(
            "clock",
            WidgetConfig {
                append_to: "desktop".to_string().into(),
                ..Default::default()
            },
        );

        let outcome = loader.load(&spec).await.unwrap();

        let err = outcome.error().unwrap();
        assert!(err.to_string().contains("mount target 'desktop' is not loaded"));
    }
}
