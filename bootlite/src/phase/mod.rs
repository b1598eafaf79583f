//! Phase execution.
//!
//! A phase loads its enabled components either one at a time in priority
//! order, or through the dependency scheduler. Optional failures never stop
//! a phase from completing; only fatal errors propagate.

mod tracker;

pub use tracker::{PhaseState, PhaseTracker};

use crate::config::{ComponentSpec, PhaseSpec};
use crate::loader::ComponentLoader;
use crate::metrics::{ComponentMetrics, ExecutionMode, LoadStatus, PhaseMetrics};
use crate::scheduler::{QueueLimits, run_parallel};
use bootlite_shared::errors::BootResult;
use tokio::time::Instant;

/// Run every enabled component of `phase`.
///
/// Does not mark the phase completed; the caller owns the tracker.
pub async fn run_phase(
    loader: &ComponentLoader,
    phase: &PhaseSpec,
    limits: QueueLimits,
) -> BootResult<PhaseMetrics> {
    let start = Instant::now();
    let execution = ExecutionMode::from_parallel(phase.parallel);
    let components = phase.enabled_components();

    tracing::info!(
        phase = %phase.name,
        execution = ?execution,
        components = components.len(),
        "Starting phase"
    );

    let metrics = match execution {
        _ if components.is_empty() => Vec::new(),
        ExecutionMode::Parallel => run_parallel(loader, &components, limits).await?,
        ExecutionMode::Sequential => run_sequential(loader, &components).await?,
    };

    let phase_metrics = PhaseMetrics {
        name: phase.name.clone(),
        execution,
        duration_ms: start.elapsed().as_millis(),
        components: metrics,
    };

    tracing::info!(
        phase = %phase.name,
        duration_ms = phase_metrics.duration_ms as u64,
        loaded = phase_metrics.count(LoadStatus::Loaded),
        fallback = phase_metrics.count(LoadStatus::Fallback),
        failed = phase_metrics.count(LoadStatus::Failed) + phase_metrics.count(LoadStatus::Unresolved),
        "Phase finished"
    );

    Ok(phase_metrics)
}

/// Priority order, one at a time. Missing dependencies are only warned about.
async fn run_sequential(
    loader: &ComponentLoader,
    components: &[&ComponentSpec],
) -> BootResult<Vec<ComponentMetrics>> {
    let mut metrics = Vec::with_capacity(components.len());

    for spec in components {
        let dependencies = spec.load_dependencies();
        let missing = loader.registry().missing(&dependencies);
        if !missing.is_empty() {
            tracing::warn!(
                component = %spec.name,
                missing = ?missing,
                "Loading with unavailable dependencies"
            );
        }
        metrics.push(loader.attempt(spec).await?);
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::NoWidgetRegistry;
    use crate::config::StartupConfig;
    use crate::loader::ExecutionContext;
    use crate::registry::ComponentRegistry;
    use crate::testing::MockResolver;
    use bootlite_shared::errors::BootError;
    use serde_json::json;
    use std::sync::Arc;

    fn loader(resolver: Arc<MockResolver>) -> ComponentLoader {
        ComponentLoader::new(
            resolver,
            Arc::new(NoWidgetRegistry),
            ComponentRegistry::new(),
            Arc::new(StartupConfig::from_json(r#"{"startup":{"phases":[]}}"#).unwrap()),
            Arc::new(ExecutionContext::new()),
        )
    }

    fn phase(value: serde_json::Value) -> PhaseSpec {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_sequential_runs_in_priority_order() {
        let resolver = Arc::new(MockResolver::new());
        let loader = loader(Arc::clone(&resolver));
        let phase = phase(json!({
            "name": "core",
            "components": [
                { "name": "late", "path": "late", "priority": 5 },
                { "name": "early", "path": "early", "priority": -1 },
                { "name": "off", "path": "off", "enabled": false },
                { "name": "mid", "path": "mid" }
            ]
        }));

        let metrics = run_phase(&loader, &phase, QueueLimits::new(4, 0))
            .await
            .unwrap();

        assert_eq!(metrics.execution, ExecutionMode::Sequential);
        assert_eq!(loader.registry().names(), vec!["early", "mid", "late"]);
        assert!(metrics.component("off").is_none());
        assert_eq!(resolver.calls("off"), 0);
    }

    #[tokio::test]
    async fn test_sequential_loads_despite_missing_dependency() {
        let loader = loader(Arc::new(MockResolver::new()));
        let phase = phase(json!({
            "name": "core",
            "components": [
                { "name": "settings", "path": "settings", "dependencies": ["event-bus"] }
            ]
        }));

        let metrics = run_phase(&loader, &phase, QueueLimits::new(4, 0))
            .await
            .unwrap();

        assert_eq!(metrics.count(LoadStatus::Loaded), 1);
    }

    #[tokio::test]
    async fn test_empty_phase_completes() {
        let loader = loader(Arc::new(MockResolver::new()));
        let phase = phase(json!({
            "name": "empty",
            "parallel": true,
            "components": [{ "name": "off", "path": "off", "enabled": false }]
        }));

        let metrics = run_phase(&loader, &phase, QueueLimits::new(4, 0))
            .await
            .unwrap();

        assert!(metrics.components.is_empty());
        assert_eq!(metrics.execution, ExecutionMode::Parallel);
    }

    #[tokio::test]
    async fn test_optional_failure_does_not_fail_phase() {
        let loader = loader(Arc::new(MockResolver::new().fail("dock")));
        let phase = phase(json!({
            "name": "shell",
            "parallel": true,
            "components": [
                { "name": "dock", "path": "dock" },
                { "name": "desktop", "path": "desktop" }
            ]
        }));

        let metrics = run_phase(&loader, &phase, QueueLimits::new(4, 0))
            .await
            .unwrap();

        assert_eq!(metrics.count(LoadStatus::Failed), 1);
        assert_eq!(metrics.count(LoadStatus::Loaded), 1);
    }

    #[tokio::test]
    async fn test_required_failure_stops_sequential_phase() {
        let resolver = Arc::new(MockResolver::new().fail("event-bus"));
        let loader = loader(Arc::clone(&resolver));
        let phase = phase(json!({
            "name": "core",
            "components": [
                { "name": "event-bus", "path": "event-bus", "required": true },
                { "name": "settings", "path": "settings" }
            ]
        }));

        let err = run_phase(&loader, &phase, QueueLimits::new(4, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, BootError::RequiredComponent { .. }));
        assert_eq!(resolver.calls("settings"), 0);
    }
}
