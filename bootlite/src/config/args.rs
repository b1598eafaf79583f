//! Declarative constructor and post-init arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One argument of a constructor or post-init call.
///
/// Serialized externally tagged:
///
/// ```text
/// {"value": 42}                       literal
/// {"dep": "event-bus"}                already-loaded component
/// {"config": "startup.features.dock"} value from the configuration document
/// {"context": "surface"}              entry of the orchestrator's execution context
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgSpec {
    Value(Value),
    Dep(String),
    Config(String),
    Context(String),
}

impl ArgSpec {
    pub fn literal(value: impl Into<Value>) -> Self {
        ArgSpec::Value(value.into())
    }

    pub fn dep(name: impl Into<String>) -> Self {
        ArgSpec::Dep(name.into())
    }

    pub fn config(path: impl Into<String>) -> Self {
        ArgSpec::Config(path.into())
    }

    pub fn context(name: impl Into<String>) -> Self {
        ArgSpec::Context(name.into())
    }

    /// Component this argument refers to, if it is a dependency reference.
    pub fn dependency(&self) -> Option<&str> {
        match self {
            ArgSpec::Dep(name) => Some(name),
            _ => None,
        }
    }
}
