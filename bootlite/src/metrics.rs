//! Startup timing and outcome metrics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Execution mode of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Dependency-ordered loads, bounded by `maxConcurrentLoads`
    Parallel,
    /// One load at a time, ascending priority
    Sequential,
}

impl ExecutionMode {
    pub fn from_parallel(parallel: bool) -> Self {
        if parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        }
    }
}

/// What happened to one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loaded,
    Cached,
    Fallback,
    Failed,
    Skipped,
    Unresolved,
}

impl LoadStatus {
    /// True when the component has a registry entry afterwards.
    pub fn is_registered(self) -> bool {
        matches!(
            self,
            LoadStatus::Loaded | LoadStatus::Cached | LoadStatus::Fallback
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentMetrics {
    pub name: String,
    pub status: LoadStatus,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseMetrics {
    pub name: String,
    pub execution: ExecutionMode,
    pub duration_ms: u128,
    pub components: Vec<ComponentMetrics>,
}

impl PhaseMetrics {
    pub fn component(&self, name: &str) -> Option<&ComponentMetrics> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn count(&self, status: LoadStatus) -> usize {
        self.components.iter().filter(|c| c.status == status).count()
    }
}

/// Summary of a completed run.
///
/// Deferred phases are listed by name only; they finish after the report
/// is produced.
#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub total_duration_ms: u128,
    pub phases: Vec<PhaseMetrics>,
    pub deferred: Vec<String>,
}

impl StartupReport {
    pub fn phase(&self, name: &str) -> Option<&PhaseMetrics> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn component_duration_ms(&self, name: &str) -> Option<u128> {
        self.phases
            .iter()
            .flat_map(|phase| phase.components.iter())
            .find(|component| component.name == name)
            .map(|component| component.duration_ms)
    }
}

/// Live view for diagnostics: elapsed time, loaded count, completed phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupMetrics {
    pub elapsed: Duration,
    pub loaded_components: usize,
    pub completed_phases: Vec<String>,
}
