//! Test doubles for resolvers, widgets and components.

use crate::component::{
    Arg, Binding, Component, ComponentRef, Mount, ModuleBindings, ModuleResolver, WidgetHandle,
    WidgetRegistry,
};
use async_trait::async_trait;
use bootlite_shared::errors::{BootError, BootResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn render_args(args: &[Arg]) -> String {
    args.iter()
        .map(|arg| match arg {
            Arg::Value(value) => value.to_string(),
            Arg::Component(_) => "<component>".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Component that records every call made on it.
pub struct RecordingComponent {
    name: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_log(name, Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(name: impl Into<String>, calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.into(),
            calls,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Component for RecordingComponent {
    async fn invoke(&self, method: &str, args: Vec<Arg>) -> BootResult<Value> {
        self.calls
            .lock()
            .push(format!("{}({})", method, render_args(&args)));
        if method == "explode" {
            return Err(BootError::Internal(format!("{} exploded", self.name)));
        }
        Ok(Value::Null)
    }
}

/// Module whose default export records construction and method calls.
pub fn recording_module() -> (ModuleBindings, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);
    let bindings = ModuleBindings::with_default(Binding::factory(move |args| {
        log.lock().push(format!("construct({})", render_args(&args)));
        Ok(Arc::new(RecordingComponent::with_log("recorded", Arc::clone(&log))) as ComponentRef)
    }));
    (bindings, calls)
}

fn plain_module(locator: &str) -> ModuleBindings {
    let name = locator.to_string();
    ModuleBindings::with_default(Binding::factory(move |_| {
        Ok(Arc::new(RecordingComponent::new(name.clone())) as ComponentRef)
    }))
}

/// Resolver with per-locator delays, failures, and call accounting.
///
/// Unknown locators resolve to a plain module immediately.
#[derive(Default)]
pub struct MockResolver {
    delays: HashMap<String, u64>,
    failures: HashSet<String>,
    modules: HashMap<String, ModuleBindings>,
    calls: Mutex<HashMap<String, usize>>,
    events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, locator: &str, ms: u64) -> Self {
        self.delays.insert(locator.to_string(), ms);
        self
    }

    pub fn fail(mut self, locator: &str) -> Self {
        self.failures.insert(locator.to_string());
        self
    }

    pub fn module(mut self, locator: &str, bindings: ModuleBindings) -> Self {
        self.modules.insert(locator.to_string(), bindings);
        self
    }

    pub fn calls(&self, locator: &str) -> usize {
        self.calls.lock().get(locator).copied().unwrap_or(0)
    }

    /// `start:<locator>` / `end:<locator>` in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleResolver for MockResolver {
    async fn resolve(&self, locator: &str) -> BootResult<ModuleBindings> {
        *self.calls.lock().entry(locator.to_string()).or_insert(0) += 1;
        self.events.lock().push(format!("start:{}", locator));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.delays.get(locator).copied().unwrap_or(0);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().push(format!("end:{}", locator));

        if self.failures.contains(locator) {
            return Err(BootError::resolution(locator, "mock failure"));
        }
        Ok(self
            .modules
            .get(locator)
            .cloned()
            .unwrap_or_else(|| plain_module(locator)))
    }
}

/// Widget registry that records every interaction.
#[derive(Default)]
pub struct RecordingWidgets {
    unavailable: HashSet<String>,
    events: Mutex<Vec<String>>,
}

impl RecordingWidgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable(mut self, type_name: &str) -> Self {
        self.unavailable.insert(type_name.to_string());
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl WidgetRegistry for RecordingWidgets {
    async fn await_type(&self, type_name: &str) -> BootResult<()> {
        self.events.lock().push(format!("await:{}", type_name));
        if self.unavailable.contains(type_name) {
            return Err(BootError::Internal(format!(
                "widget type '{}' never defined",
                type_name
            )));
        }
        Ok(())
    }

    fn instantiate(&self, type_name: &str) -> BootResult<ComponentRef> {
        self.events.lock().push(format!("instantiate:{}", type_name));
        Ok(Arc::new(RecordingComponent::new(type_name)))
    }

    fn attach(&self, handle: &WidgetHandle, mount: &Mount) -> BootResult<()> {
        let target = match mount {
            Mount::Surface => "surface".to_string(),
            Mount::Container { owner, .. } => format!("{}.container", owner),
        };
        self.events
            .lock()
            .push(format!("attach:{}@{}", handle.id, target));
        Ok(())
    }
}
