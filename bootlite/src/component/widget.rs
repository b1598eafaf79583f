//! Widget registry contract.

use super::ComponentRef;
use async_trait::async_trait;
use bootlite_shared::errors::{BootError, BootResult};
use std::collections::BTreeMap;

/// A created widget, before and after attachment.
#[derive(Clone)]
pub struct WidgetHandle {
    pub id: String,
    pub type_name: String,
    pub attributes: BTreeMap<String, String>,
    pub instance: ComponentRef,
}

impl std::fmt::Debug for WidgetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHandle")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Resolved attachment target.
#[derive(Clone)]
pub enum Mount {
    /// The standard surface.
    Surface,
    /// Internal container of an already-loaded component.
    Container { owner: String, component: ComponentRef },
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mount::Surface => f.write_str("Surface"),
            Mount::Container { owner, .. } => f.debug_struct("Container").field("owner", owner).finish(),
        }
    }
}

/// Host side of widget components.
#[async_trait]
pub trait WidgetRegistry: Send + Sync {
    /// Resolve once `type_name` can be instantiated.
    async fn await_type(&self, type_name: &str) -> BootResult<()>;

    /// Create a fresh instance of `type_name`.
    fn instantiate(&self, type_name: &str) -> BootResult<ComponentRef>;

    /// Attach a configured widget to its mount point.
    fn attach(&self, handle: &WidgetHandle, mount: &Mount) -> BootResult<()>;
}

/// Registry used when the host provides none. Every widget fails to load.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWidgetRegistry;

#[async_trait]
impl WidgetRegistry for NoWidgetRegistry {
    async fn await_type(&self, type_name: &str) -> BootResult<()> {
        Err(BootError::Internal(format!(
            "no widget registry configured for widget type '{}'",
            type_name
        )))
    }

    fn instantiate(&self, type_name: &str) -> BootResult<ComponentRef> {
        Err(BootError::Internal(format!(
            "no widget registry configured for widget type '{}'",
            type_name
        )))
    }

    fn attach(&self, handle: &WidgetHandle, _mount: &Mount) -> BootResult<()> {
        Err(BootError::Internal(format!(
            "no widget registry configured to attach '{}'",
            handle.id
        )))
    }
}
