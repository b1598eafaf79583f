//! Command-line tooling for startup documents.
//!
//! - `validate`: check a document and print warnings
//! - `plan`: show phase order and the dependency waves of parallel phases
//! - `simulate`: run the orchestrator against no-op components

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bootlite::component::{
    Binding, Component, ComponentRef, ModuleBindings, ModuleResolver, Mount, WidgetHandle,
    WidgetRegistry,
};
use bootlite::config::{
    BoxedSource, FileSource, StartupConfig, default_sources, load_startup_config, validate,
};
use bootlite::metrics::ExecutionMode;
use bootlite::scheduler::plan_waves;
use bootlite::{Arg, BootError, BootResult, LoggingOptions, Orchestrator, init_logging};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bootlite")]
#[command(about = "Inspect and exercise startup documents", version)]
struct Cli {
    /// Log filter directive (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write rotated log files into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a startup document
    Validate {
        /// Path to the document
        file: PathBuf,
    },
    /// Print phases in execution order with their load waves
    Plan {
        /// Path to the document (default: override, then built-in)
        file: Option<PathBuf>,
    },
    /// Run startup with no-op components and print the report as JSON
    Simulate {
        /// Path to the document (default: override, then built-in)
        file: Option<PathBuf>,

        /// Make this component's module fail to resolve (repeatable)
        #[arg(long = "fail", value_name = "COMPONENT")]
        fail: Vec<String>,

        /// Resolution delay applied to every module, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging(&LoggingOptions {
        filter: Some(cli.log_level.clone()),
        log_dir: cli.log_dir.clone(),
    })?;

    match cli.command {
        Commands::Validate { file } => validate_document(&file),
        Commands::Plan { file } => plan(file).await,
        Commands::Simulate {
            file,
            fail,
            delay_ms,
        } => simulate(file, fail, delay_ms).await,
    }
}

fn validate_document(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let config = StartupConfig::from_json(&text)?;

    match validate(&config) {
        Ok(report) => {
            for warning in &report.warnings {
                println!("warning: {}", warning);
            }
            println!(
                "{}: ok ({} phases, {} warnings)",
                file.display(),
                config.phases().len(),
                report.warnings.len()
            );
            Ok(())
        }
        Err(BootError::Config(errors)) => {
            for error in errors.split("; ") {
                println!("error: {}", error);
            }
            bail!("{} is invalid", file.display())
        }
        Err(e) => Err(e.into()),
    }
}

async fn load(file: Option<PathBuf>) -> Result<StartupConfig> {
    let config = match file {
        Some(path) => {
            let sources: Vec<BoxedSource> = vec![Box::new(FileSource::new(path))];
            load_startup_config(&sources).await?
        }
        None => load_startup_config(&default_sources(None)).await?,
    };
    Ok(config)
}

async fn plan(file: Option<PathBuf>) -> Result<()> {
    let config = load(file).await?;
    let performance = config.performance();
    println!(
        "maxConcurrentLoads={} timeoutMs={} retryAttempts={}",
        performance.max_concurrent_loads, performance.timeout_ms, performance.retry_attempts
    );

    for (index, phase) in config.phases().iter().enumerate() {
        let mode = ExecutionMode::from_parallel(phase.parallel);
        let mut line = format!("{}. {} ({:?})", index + 1, phase.name, mode);
        if let Some(wait_for) = &phase.wait_for {
            line.push_str(&format!(" waitFor={}", wait_for));
        }
        if phase.defer {
            line.push_str(" deferred");
        }
        println!("{}", line);

        let components = phase.enabled_components();
        match mode {
            ExecutionMode::Sequential => {
                for (step, spec) in components.iter().enumerate() {
                    println!("   {}: {}", step + 1, spec.name);
                }
            }
            ExecutionMode::Parallel => {
                for (wave, names) in plan_waves(&components).iter().enumerate() {
                    println!("   wave {}: {}", wave + 1, names.join(", "));
                }
            }
        }
    }
    Ok(())
}

async fn simulate(file: Option<PathBuf>, fail: Vec<String>, delay_ms: u64) -> Result<()> {
    let config = load(file).await?;

    let mut failing = HashSet::new();
    for name in &fail {
        let Some(spec) = config.component(name) else {
            bail!("--fail {}: no such component", name);
        };
        failing.insert(spec.path.clone());
    }

    let orchestrator = Orchestrator::builder(config)
        .resolver(Arc::new(SimulatedResolver {
            failing,
            delay: Duration::from_millis(delay_ms),
        }))
        .widgets(Arc::new(SimulatedWidgets))
        .build()?;

    let report = orchestrator.run().await?;
    for phase in &report.deferred {
        orchestrator.wait_for_phase(phase).await?;
    }

    let output = serde_json::json!({
        "report": report,
        "final": orchestrator.metrics(),
        "registered": orchestrator.registry().names(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

struct NoopComponent;

#[async_trait]
impl Component for NoopComponent {
    async fn invoke(&self, _method: &str, _args: Vec<Arg>) -> BootResult<Value> {
        Ok(Value::Null)
    }
}

struct SimulatedResolver {
    failing: HashSet<String>,
    delay: Duration,
}

#[async_trait]
impl ModuleResolver for SimulatedResolver {
    async fn resolve(&self, locator: &str) -> BootResult<ModuleBindings> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(locator) {
            return Err(BootError::resolution(locator, "simulated failure"));
        }
        Ok(ModuleBindings::with_default(Binding::factory(|_| {
            Ok(Arc::new(NoopComponent) as ComponentRef)
        })))
    }
}

struct SimulatedWidgets;

#[async_trait]
impl WidgetRegistry for SimulatedWidgets {
    async fn await_type(&self, _type_name: &str) -> BootResult<()> {
        Ok(())
    }

    fn instantiate(&self, _type_name: &str) -> BootResult<ComponentRef> {
        Ok(Arc::new(NoopComponent))
    }

    fn attach(&self, handle: &WidgetHandle, mount: &Mount) -> BootResult<()> {
        let target = match mount {
            Mount::Surface => "surface".to_string(),
            Mount::Container { owner, .. } => owner.clone(),
        };
        tracing::info!(widget = %handle.id, target, attributes = ?handle.attributes, "Widget attached");
        Ok(())
    }
}
