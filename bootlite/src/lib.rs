//! Bootlite: phased bootstrap orchestration.
//!
//! A startup document lists phases; each phase lists components. The
//! [`Orchestrator`] walks the phases in order and, per component, resolves
//! its module, constructs it (or instantiates and attaches it as a widget),
//! runs optional post-init, and registers it under its name.
//!
//! ```text
//! StartupConfig ──→ Orchestrator ──→ phase ──┬─ sequential: priority order
//!                                            └─ parallel:   dependency scheduler
//!                                                              │
//!                                     ComponentLoader ←────────┘
//!                                            │
//!                                     ComponentRegistry
//! ```
//!
//! Required components abort the run when they fail. Optional ones are
//! logged and, with `fallbackGraceful`, replaced by a no-op stand-in.

pub mod component;
pub mod config;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod phase;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use bootlite_shared::errors::{BootError, BootResult};
pub use component::{
    Arg, Binding, Component, ComponentRef, ModuleBindings, ModuleResolver, StaticModuleResolver,
    WidgetRegistry,
};
pub use config::{ArgSpec, StartupConfig, load_startup_config};
pub use loader::ExecutionContext;
pub use logging::{LoggingOptions, init_logging};
pub use metrics::{StartupMetrics, StartupReport};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use registry::ComponentRegistry;
