//! Configuration document types.
//!
//! The document is JSON of the form:
//!
//! ```text
//! { "startup": { "phases": [...], "performance": {...}, "features": {...} } }
//! ```

use super::args::ArgSpec;
use bootlite_shared::errors::{BootError, BootResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Top-level configuration document as it appears on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupDocument {
    pub startup: StartupSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupSection {
    pub phases: Vec<PhaseSpec>,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub features: Map<String, Value>,
}

/// An ordered group of components sharing an execution mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSpec {
    pub name: String,
    #[serde(default)]
    pub parallel: bool,
    /// Phase that must be completed before this one starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<String>,
    /// Lazy phase, scheduled after a delay when startup is already slow.
    #[serde(default)]
    pub defer: bool,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl PhaseSpec {
    /// Enabled components sorted by ascending priority.
    ///
    /// The sort is stable, so equal priorities keep declaration order.
    pub fn enabled_components(&self) -> Vec<&ComponentSpec> {
        let mut components: Vec<&ComponentSpec> =
            self.components.iter().filter(|c| c.enabled).collect();
        components.sort_by_key(|c| c.priority);
        components
    }
}

/// A named, independently loadable unit of functionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub name: String,
    /// Locator handed to the module resolver.
    pub path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub is_widget: bool,
    #[serde(default)]
    pub fallback_graceful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<WidgetConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructor_args: Vec<ArgSpec>,
    /// Method invoked on the new instance right after construction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_args: Vec<ArgSpec>,
    /// Await `init_method` instead of running it detached.
    #[serde(default)]
    pub await_init: bool,
}

impl ComponentSpec {
    /// Minimal enabled, optional component with no dependencies.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            enabled: true,
            required: false,
            priority: 0,
            dependencies: Vec::new(),
            is_widget: false,
            fallback_graceful: false,
            widget_config: None,
            constructor_args: Vec::new(),
            init_method: None,
            init_args: Vec::new(),
            await_init: false,
        }
    }

    /// Components that must be registered before this one can load.
    ///
    /// Declared `dependencies` first, then the widget's container owner and
    /// connect target, without duplicates or self references.
    pub fn load_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.dependencies.len() + 2);
        let widget_targets = self.widget_config.iter().flat_map(|widget| widget.targets());

        for name in self.dependencies.iter().map(String::as_str).chain(widget_targets) {
            if name != self.name && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

fn default_true() -> bool {
    true
}

/// Widget instantiation and attachment settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Widget type name. Defaults to the component name.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Identifier assigned to the instance. Defaults to the component name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub append_to: MountPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_method: Option<String>,
}

impl WidgetConfig {
    /// Components looked up in the registry while the widget loads.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        let container = match &self.append_to {
            MountPoint::Surface => None,
            MountPoint::Container(owner) => Some(owner.as_str()),
        };
        let connect = self
            .connect_to
            .as_deref()
            .filter(|_| self.connect_method.is_some());
        container.into_iter().chain(connect)
    }
}

/// Where a widget instance is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MountPoint {
    /// The standard surface every widget lands on by default.
    #[default]
    Surface,
    /// The internal container of an already-loaded component.
    Container(String),
}

impl MountPoint {
    pub const SURFACE: &'static str = "surface";
}

impl From<String> for MountPoint {
    fn from(value: String) -> Self {
        if value.is_empty() || value == Self::SURFACE {
            MountPoint::Surface
        } else {
            MountPoint::Container(value)
        }
    }
}

impl From<MountPoint> for String {
    fn from(value: MountPoint) -> Self {
        match value {
            MountPoint::Surface => MountPoint::SURFACE.to_string(),
            MountPoint::Container(name) => name,
        }
    }
}

impl std::fmt::Display for MountPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountPoint::Surface => f.write_str(Self::SURFACE),
            MountPoint::Container(name) => write!(f, "{}.container", name),
        }
    }
}

/// Load tuning shared by all phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceConfig {
    #[serde(default = "default_max_concurrent_loads")]
    pub max_concurrent_loads: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry rounds over components whose dependencies were not yet loaded.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_max_concurrent_loads() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_retry_attempts() -> u32 {
    5
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: default_max_concurrent_loads(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl PerformanceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Parsed configuration plus the raw document it came from.
///
/// The raw value backs `{"config": "a.b.c"}` argument references, which may
/// point anywhere in the document, including keys the typed view ignores.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    document: StartupDocument,
    raw: Value,
}

impl StartupConfig {
    pub fn from_document(document: StartupDocument) -> BootResult<Self> {
        let raw = serde_json::to_value(&document)?;
        Ok(Self { document, raw })
    }

    /// Parse from JSON text, keeping unknown keys reachable through `lookup`.
    pub fn from_json(text: &str) -> BootResult<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> BootResult<Self> {
        let document: StartupDocument = serde_json::from_value(raw.clone())
            .map_err(|e| BootError::Config(format!("malformed startup document: {}", e)))?;
        Ok(Self { document, raw })
    }

    pub fn document(&self) -> &StartupDocument {
        &self.document
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.document.startup.phases
    }

    pub fn performance(&self) -> &PerformanceConfig {
        &self.document.startup.performance
    }

    pub fn features(&self) -> &Map<String, Value> {
        &self.document.startup.features
    }

    /// Feature flags are truthy only when set to boolean `true`.
    pub fn feature_enabled(&self, name: &str) -> bool {
        matches!(self.features().get(name), Some(Value::Bool(true)))
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseSpec> {
        self.phases().iter().find(|p| p.name == name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.phases()
            .iter()
            .flat_map(|p| p.components.iter())
            .find(|c| c.name == name)
    }

    /// Look up a dotted path in the raw document, e.g. `startup.performance.timeoutMs`.
    ///
    /// Numeric segments index into arrays.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.raw, |value, segment| match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}
