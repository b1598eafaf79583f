//! No-op stand-in registered for optional components that failed to load.

use super::{Arg, Component};
use async_trait::async_trait;
use bootlite_shared::errors::BootResult;
use serde_json::Value;

/// Satisfies presence checks of dependents; every call resolves to `null`.
#[derive(Debug, Clone)]
pub struct FallbackComponent {
    name: String,
}

impl FallbackComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Component for FallbackComponent {
    async fn invoke(&self, method: &str, _args: Vec<Arg>) -> BootResult<Value> {
        tracing::trace!(component = %self.name, method, "Ignoring call on fallback component");
        Ok(Value::Null)
    }
}
