//! Per-run state.

use crate::config::StartupConfig;
use crate::metrics::StartupMetrics;
use crate::phase::PhaseTracker;
use crate::registry::ComponentRegistry;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Everything a single run creates: registry, phase flags and clock.
///
/// A new session starts on every `run()`, so nothing loaded by a previous
/// run is visible to the next one.
pub(crate) struct Session {
    pub(crate) run_id: String,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) start: Instant,
    pub(crate) registry: ComponentRegistry,
    pub(crate) tracker: PhaseTracker,
}

impl Session {
    pub(crate) fn new(config: &StartupConfig) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            start: Instant::now(),
            registry: ComponentRegistry::new(),
            tracker: PhaseTracker::new(config.phases().iter().map(|p| p.name.as_str())),
        }
    }

    pub(crate) fn metrics(&self) -> StartupMetrics {
        StartupMetrics {
            elapsed: self.start.elapsed(),
            loaded_components: self.registry.len(),
            completed_phases: self.tracker.completed(),
        }
    }
}
