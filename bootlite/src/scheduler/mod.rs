//! Dependency-ordered loading for parallel phases.
//!
//! A component starts only once every dependency is in the registry. Loads
//! that are ready run concurrently, capped at `maxConcurrentLoads`. When
//! nothing is ready or in flight but components are still waiting, a retry
//! round re-checks them against the registry after [`RETRY_ROUND_DELAY`],
//! up to `retryAttempts` times. Whatever is still waiting after that is
//! reported as unresolved; for a required component this is fatal.

mod graph;

pub use graph::plan_waves;

use crate::config::ComponentSpec;
use crate::loader::ComponentLoader;
use crate::metrics::{ComponentMetrics, LoadStatus};
use bootlite_shared::errors::{BootError, BootResult};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use graph::DependencyGraph;
use std::future::Future;
use std::time::Duration;

/// Pause between retry rounds.
pub const RETRY_ROUND_DELAY: Duration = Duration::from_millis(100);

/// Bounds for one parallel run.
#[derive(Debug, Clone, Copy)]
pub struct QueueLimits {
    pub max_concurrent: usize,
    pub retry_rounds: u32,
    pub round_delay: Duration,
}

impl QueueLimits {
    pub fn new(max_concurrent: usize, retry_rounds: u32) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            retry_rounds,
            round_delay: RETRY_ROUND_DELAY,
        }
    }
}

fn attempt<'a>(
    loader: &'a ComponentLoader,
    index: usize,
    spec: &'a ComponentSpec,
) -> impl Future<Output = BootResult<(usize, ComponentMetrics)>> + 'a {
    async move {
        let metrics = loader.attempt(spec).await?;
        Ok((index, metrics))
    }
}

/// Load `components` in dependency order.
///
/// `components` should be enabled and sorted by priority; ties in readiness
/// are started in that order.
///
/// # Errors
///
/// Returns the first fatal error: a required component failing to load, or
/// a required component whose dependencies never became available. Loads
/// still in flight at that point are dropped.
pub async fn run_parallel(
    loader: &ComponentLoader,
    components: &[&ComponentSpec],
    limits: QueueLimits,
) -> BootResult<Vec<ComponentMetrics>> {
    let registry = loader.registry();
    let mut graph = DependencyGraph::build(components, registry);
    let mut ready = graph.take_ready(registry);
    let mut in_flight = FuturesUnordered::new();
    let mut metrics = Vec::with_capacity(components.len());
    let mut round = 0u32;

    loop {
        while in_flight.len() < limits.max_concurrent {
            let Some(index) = ready.pop_front() else {
                break;
            };
            in_flight.push(attempt(loader, index, graph.spec(index)));
        }

        if let Some(result) = in_flight.next().await {
            let (index, component) = result?;
            let released = graph.complete(index, component.status.is_registered(), registry);
            ready.extend(released);
            metrics.push(component);
            continue;
        }

        if !graph.has_waiting() || round >= limits.retry_rounds {
            break;
        }

        round += 1;
        tokio::time::sleep(limits.round_delay).await;
        ready = graph.revive(registry);
        tracing::debug!(
            round,
            revived = ready.len(),
            "Retry round for components with pending dependencies"
        );
    }

    for (spec, missing) in graph.waiting(registry) {
        let error = BootError::Unresolved {
            component: spec.name.clone(),
            missing,
        };

        if spec.required {
            tracing::error!(component = %spec.name, error = %error, "Required component unresolved");
            return Err(BootError::required(&spec.name, error));
        }

        tracing::warn!(component = %spec.name, error = %error, "Component unresolved, not loaded");
        metrics.push(ComponentMetrics {
            name: spec.name.clone(),
            status: LoadStatus::Unresolved,
            duration_ms: 0,
            error: Some(error.to_string()),
        });
    }

    Ok(metrics)
}
