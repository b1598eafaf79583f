//! End-to-end startup of the built-in document through the public API.

use async_trait::async_trait;
use bootlite::component::{Mount, WidgetHandle};
use bootlite::config::{BoxedSource, DefaultSource};
use bootlite::metrics::LoadStatus;
use bootlite::{
    Arg, Binding, BootError, BootResult, Component, ComponentRef, ExecutionContext,
    ModuleBindings, Orchestrator, StaticModuleResolver, WidgetRegistry, load_startup_config,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;

type Journal = Arc<Mutex<Vec<String>>>;

struct Recorder {
    name: String,
    journal: Journal,
}

#[async_trait]
impl Component for Recorder {
    async fn invoke(&self, method: &str, args: Vec<Arg>) -> BootResult<Value> {
        self.journal
            .lock()
            .push(format!("{}.{}/{}", self.name, method, args.len()));
        Ok(Value::Null)
    }
}

fn recorder_module(name: &str, journal: &Journal) -> ModuleBindings {
    let name = name.to_string();
    let journal = Arc::clone(journal);
    ModuleBindings::with_default(Binding::factory(move |args| {
        let rendered: Vec<String> = args
            .iter()
            .map(|arg| match arg.as_value() {
                Some(value) => value.to_string(),
                None => "<component>".to_string(),
            })
            .collect();
        journal
            .lock()
            .push(format!("new {}({})", name, rendered.join(", ")));
        Ok(Arc::new(Recorder {
            name: name.clone(),
            journal: Arc::clone(&journal),
        }) as ComponentRef)
    }))
}

const MODULES: &[(&str, &str)] = &[
    ("event-bus", "core/event-bus"),
    ("settings", "core/settings"),
    ("window-manager", "shell/window-manager"),
    ("desktop", "shell/desktop"),
    ("menu-bar", "shell/menu-bar"),
    ("dock", "shell/dock"),
    ("notifications", "shell/notifications"),
    ("clock", "widgets/clock"),
    ("terminal", "apps/terminal"),
    ("editor", "apps/editor"),
];

fn resolver(journal: &Journal, skip: &[&str]) -> StaticModuleResolver {
    MODULES
        .iter()
        .filter(|(name, _)| !skip.contains(name))
        .fold(StaticModuleResolver::new(), |resolver, (name, path)| {
            resolver.register(*path, recorder_module(name, journal))
        })
}

struct Widgets {
    journal: Journal,
}

#[async_trait]
impl WidgetRegistry for Widgets {
    async fn await_type(&self, _type_name: &str) -> BootResult<()> {
        Ok(())
    }

    fn instantiate(&self, type_name: &str) -> BootResult<ComponentRef> {
        Ok(Arc::new(Recorder {
            name: type_name.to_string(),
            journal: Arc::clone(&self.journal),
        }))
    }

    fn attach(&self, handle: &WidgetHandle, mount: &Mount) -> BootResult<()> {
        let target = match mount {
            Mount::Surface => "surface".to_string(),
            Mount::Container { owner, .. } => owner.clone(),
        };
        self.journal.lock().push(format!(
            "attach {}[{}] -> {}",
            handle.id,
            handle.attributes.get("format").map(String::as_str).unwrap_or(""),
            target
        ));
        Ok(())
    }
}

async fn orchestrator(journal: &Journal, skip: &[&str]) -> Orchestrator {
    let sources: Vec<BoxedSource> = vec![Box::new(DefaultSource::new())];
    let config = load_startup_config(&sources).await.unwrap();

    Orchestrator::builder(config)
        .resolver(Arc::new(resolver(journal, skip)))
        .widgets(Arc::new(Widgets {
            journal: Arc::clone(journal),
        }))
        .context(ExecutionContext::new().with("surface", json!("main-surface")))
        .build()
        .unwrap()
}

fn position(journal: &[String], entry: &str) -> usize {
    journal
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("'{}' not in journal: {:?}", entry, journal))
}

#[tokio::test]
async fn test_builtin_document_starts_every_component() {
    let journal: Journal = Arc::default();
    let orchestrator = orchestrator(&journal, &[]).await;

    let report = orchestrator.run().await.unwrap();
    for phase in &report.deferred {
        orchestrator.wait_for_phase(phase).await.unwrap();
    }

    let registry = orchestrator.registry();
    for (name, _) in MODULES {
        assert!(registry.contains(name), "{} not registered", name);
    }
    assert_eq!(
        orchestrator.metrics().completed_phases,
        vec!["core", "shell", "widgets", "apps"]
    );

    let journal = journal.lock().clone();
    assert!(position(&journal, "new event-bus()") < position(&journal, "new settings(<component>, {\"dock\":true,\"notifications\":true})"));
    assert!(position(&journal, "window-manager.init/0") < position(&journal, "new dock(<component>, true)"));
    assert!(journal.contains(&"new desktop(<component>, \"main-surface\")".to_string()));
    assert!(position(&journal, "attach clock[24h] -> surface") < position(&journal, "menu-bar.addItem/1"));
}

#[tokio::test]
async fn test_missing_optional_modules_degrade_gracefully() {
    let journal: Journal = Arc::default();
    let orchestrator = orchestrator(&journal, &["dock", "editor"]).await;

    let report = orchestrator.run().await.unwrap();
    for phase in &report.deferred {
        orchestrator.wait_for_phase(phase).await.unwrap();
    }

    let registry = orchestrator.registry();
    assert!(registry.get("dock").unwrap().is_fallback());
    assert!(!registry.contains("editor"));
    assert!(registry.contains("terminal"));

    let shell = report.phase("shell").unwrap();
    assert_eq!(shell.component("dock").unwrap().status, LoadStatus::Fallback);
    assert!(orchestrator.is_phase_completed("apps"));
}

#[tokio::test]
async fn test_missing_required_module_aborts_startup() {
    let journal: Journal = Arc::default();
    let orchestrator = orchestrator(&journal, &["window-manager"]).await;

    let err = orchestrator.run().await.unwrap_err();

    match &err {
        BootError::RequiredComponent { component, source } => {
            assert_eq!(component, "window-manager");
            assert!(matches!(**source, BootError::Resolution { .. }));
        }
        other => panic!("expected required component error, got {:?}", other),
    }
    assert!(orchestrator.is_phase_completed("core"));
    assert!(!orchestrator.is_phase_completed("shell"));
    assert!(!orchestrator.registry().contains("clock"));
    assert!(orchestrator.wait_for_phase("widgets").await.is_err());
}
