//! Contracts between the orchestrator and the code it loads.
//!
//! ## Architecture
//!
//! ```text
//! ModuleResolver ── resolve(locator) ──→ ModuleBindings
//!                                          └─ Binding::Factory ── construct(args) ──→ Component
//! WidgetRegistry ── await_type / instantiate / attach ──→ WidgetHandle
//! ```
//!
//! Everything registered in a run is a [`Component`]: plain instances,
//! widgets and fallback stand-ins alike. Post-init calls, widget
//! connections and fallback invocations all go through
//! [`Component::invoke`].

mod fallback;
mod module;
mod widget;

pub use fallback::FallbackComponent;
pub use module::{
    Binding, ComponentFactory, DEFAULT_EXPORT, FnFactory, ModuleBindings, ModuleResolver,
    StaticModuleResolver,
};
pub use widget::{Mount, NoWidgetRegistry, WidgetHandle, WidgetRegistry};

use async_trait::async_trait;
use bootlite_shared::errors::BootResult;
use serde_json::Value;
use std::sync::Arc;

/// A live component instance.
#[async_trait]
pub trait Component: Send + Sync {
    /// Invoke a named method with resolved arguments.
    async fn invoke(&self, method: &str, args: Vec<Arg>) -> BootResult<Value>;
}

pub type ComponentRef = Arc<dyn Component>;

/// A resolved argument handed to a constructor or method.
#[derive(Clone)]
pub enum Arg {
    Value(Value),
    Component(ComponentRef),
}

impl Arg {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            Arg::Component(_) => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentRef> {
        match self {
            Arg::Component(component) => Some(component),
            Arg::Value(_) => None,
        }
    }
}

impl std::fmt::Debug for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Arg::Component(_) => f.write_str("Component(..)"),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<ComponentRef> for Arg {
    fn from(component: ComponentRef) -> Self {
        Arg::Component(component)
    }
}
