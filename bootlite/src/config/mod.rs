//! Startup configuration.
//!
//! - `types`: the document model (phases, components, performance)
//! - `args`: tagged constructor/post-init argument references
//! - `validate`: up-front rejection of documents that would deadlock
//! - `source`: layered sources (override, static file, embedded default)

mod args;
mod source;
mod types;
mod validate;

pub use args::ArgSpec;
pub use source::{
    BoxedSource, ConfigSource, DEFAULT_DOCUMENT, DefaultSource, FileSource, OverrideFileSource,
    default_sources, load_startup_config,
};
pub use types::{
    ComponentSpec, MountPoint, PerformanceConfig, PhaseSpec, StartupConfig, StartupDocument,
    StartupSection, WidgetConfig,
};
pub use validate::{ValidationReport, validate};
