//! Startup orchestration.
//!
//! Walks the configured phases in order. For each phase:
//!
//! 1. Wait for its `waitFor` phase to complete
//! 2. If it is deferred and startup has already taken longer than
//!    [`DEFER_THRESHOLD`], schedule it [`DEFER_DELAY`] later and move on
//! 3. Otherwise run it and mark it completed
//!
//! A fatal error (a required component failing) aborts the run. Phases that
//! have not completed are marked failed so nobody waits on them forever.

mod session;

use crate::component::{ModuleResolver, NoWidgetRegistry, WidgetRegistry};
use crate::config::{PhaseSpec, StartupConfig, validate};
use crate::loader::{ComponentLoader, ExecutionContext};
use crate::metrics::{StartupMetrics, StartupReport};
use crate::phase::{PhaseState, PhaseTracker, run_phase};
use crate::registry::ComponentRegistry;
use crate::scheduler::QueueLimits;
use bootlite_shared::errors::{BootError, BootResult};
use parking_lot::RwLock;
use session::Session;
use std::sync::Arc;
use std::time::Duration;

/// Deferred phases run inline unless startup has taken longer than this.
pub const DEFER_THRESHOLD: Duration = Duration::from_millis(1000);

/// Delay before a deferred phase starts.
pub const DEFER_DELAY: Duration = Duration::from_millis(2000);

// ============================================================================
// BUILDER
// ============================================================================

pub struct OrchestratorBuilder {
    config: StartupConfig,
    resolver: Option<Arc<dyn ModuleResolver>>,
    widgets: Option<Arc<dyn WidgetRegistry>>,
    context: ExecutionContext,
}

impl OrchestratorBuilder {
    pub fn resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn widgets(mut self, widgets: Arc<dyn WidgetRegistry>) -> Self {
        self.widgets = Some(widgets);
        self
    }

    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Validate the configuration and assemble the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns `BootError::Config` if no module resolver was supplied or
    /// the configuration fails validation.
    pub fn build(self) -> BootResult<Orchestrator> {
        let resolver = self
            .resolver
            .ok_or_else(|| BootError::Config("no module resolver configured".into()))?;

        validate(&self.config)?.log();

        Ok(Orchestrator {
            inner: Arc::new(OrchestratorInner {
                config: Arc::new(self.config),
                resolver,
                widgets: self.widgets.unwrap_or_else(|| Arc::new(NoWidgetRegistry)),
                context: Arc::new(self.context),
                session: RwLock::new(None),
            }),
        })
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Loads the configured components phase by phase.
///
/// Cheap to clone; all clones share configuration and the current session.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    config: Arc<StartupConfig>,
    resolver: Arc<dyn ModuleResolver>,
    widgets: Arc<dyn WidgetRegistry>,
    context: Arc<ExecutionContext>,
    /// Most recent run. Replaced at the start of every `run()`.
    session: RwLock<Option<Arc<Session>>>,
}

impl Orchestrator {
    pub fn builder(config: StartupConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            resolver: None,
            widgets: None,
            context: ExecutionContext::new(),
        }
    }

    pub fn config(&self) -> &StartupConfig {
        &self.inner.config
    }

    /// Run startup to completion.
    ///
    /// Returns once every non-deferred phase has completed. Deferred phases
    /// keep running in the background; use [`wait_for_phase`] to observe
    /// them.
    ///
    /// [`wait_for_phase`]: Self::wait_for_phase
    ///
    /// # Errors
    ///
    /// Returns the fatal error that aborted the run. Phases after the
    /// failing one are never started.
    pub async fn run(&self) -> BootResult<StartupReport> {
        let session = Arc::new(Session::new(&self.inner.config));
        *self.inner.session.write() = Some(Arc::clone(&session));

        let loader = ComponentLoader::new(
            Arc::clone(&self.inner.resolver),
            Arc::clone(&self.inner.widgets),
            session.registry.clone(),
            Arc::clone(&self.inner.config),
            Arc::clone(&self.inner.context),
        );
        let performance = self.inner.config.performance();
        let limits = QueueLimits::new(performance.max_concurrent_loads, performance.retry_attempts);

        tracing::info!(
            run_id = %session.run_id,
            phases = self.inner.config.phases().len(),
            max_concurrent_loads = limits.max_concurrent,
            "Starting bootstrap"
        );

        let mut phases = Vec::new();
        let mut deferred = Vec::new();

        for phase in self.inner.config.phases() {
            let result = async {
                if let Some(wait_for) = phase.wait_for.as_deref() {
                    tracing::debug!(phase = %phase.name, wait_for, "Waiting for phase");
                    session.tracker.wait(wait_for).await?;
                }

                if phase.defer && session.start.elapsed() > DEFER_THRESHOLD {
                    spawn_deferred(loader.clone(), phase.clone(), limits, session.tracker.clone());
                    return Ok(None);
                }

                let metrics = run_phase(&loader, phase, limits).await?;
                session.tracker.mark_completed(&phase.name);
                Ok::<_, BootError>(Some(metrics))
            }
            .await;

            match result {
                Ok(Some(metrics)) => phases.push(metrics),
                Ok(None) => deferred.push(phase.name.clone()),
                Err(e) => {
                    tracing::error!(
                        run_id = %session.run_id,
                        phase = %phase.name,
                        error = %e,
                        "Bootstrap aborted"
                    );
                    session.tracker.fail_pending();
                    return Err(e);
                }
            }
        }

        let report = StartupReport {
            run_id: session.run_id.clone(),
            started_at: session.started_at,
            total_duration_ms: session.start.elapsed().as_millis(),
            phases,
            deferred,
        };

        tracing::info!(
            run_id = %report.run_id,
            total_duration_ms = report.total_duration_ms as u64,
            loaded_components = session.registry.len(),
            deferred = ?report.deferred,
            "Bootstrap complete"
        );

        Ok(report)
    }

    /// Elapsed time, loaded count and completed phases of the current run.
    pub fn metrics(&self) -> StartupMetrics {
        match self.session() {
            Some(session) => session.metrics(),
            None => StartupMetrics {
                elapsed: Duration::ZERO,
                loaded_components: 0,
                completed_phases: Vec::new(),
            },
        }
    }

    /// Registry of the current run. Empty before the first run.
    pub fn registry(&self) -> ComponentRegistry {
        self.session()
            .map(|session| session.registry.clone())
            .unwrap_or_default()
    }

    pub fn is_phase_completed(&self, phase: &str) -> bool {
        self.session()
            .is_some_and(|session| session.tracker.is_completed(phase))
    }

    /// Resolve once `phase` of the current run has completed.
    ///
    /// # Errors
    ///
    /// Fails if no run has started, the phase is unknown, or the run
    /// aborted before the phase completed.
    pub async fn wait_for_phase(&self, phase: &str) -> BootResult<()> {
        let tracker = self
            .session()
            .map(|session| session.tracker.clone())
            .ok_or_else(|| BootError::Internal("startup has not been run".into()))?;
        tracker.wait(phase).await
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.inner.session.read().clone()
    }
}

/// Run `phase` after [`DEFER_DELAY`] on a background task.
///
/// Failures are logged and mark only this phase failed.
fn spawn_deferred(
    loader: ComponentLoader,
    phase: PhaseSpec,
    limits: QueueLimits,
    tracker: PhaseTracker,
) {
    tracing::info!(
        phase = %phase.name,
        delay_ms = DEFER_DELAY.as_millis() as u64,
        "Deferring phase"
    );

    tokio::spawn(async move {
        tokio::time::sleep(DEFER_DELAY).await;

        if tracker.state(&phase.name) != Some(PhaseState::Pending) {
            tracing::debug!(phase = %phase.name, "Run aborted, skipping deferred phase");
            return;
        }

        match run_phase(&loader, &phase, limits).await {
            Ok(_) => tracker.mark_completed(&phase.name),
            Err(e) => {
                tracing::error!(phase = %phase.name, error = %e, "Deferred phase failed");
                tracker.mark_failed(&phase.name);
            }
        }
    });
}
