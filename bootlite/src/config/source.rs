//! Layered configuration sources.
//!
//! Precedence is the order of the source list handed to
//! [`load_startup_config`]; the conventional stack is:
//!
//! ```text
//! 1. OverrideFileSource   persisted override written by the settings UI
//! 2. FileSource           static document shipped with the application
//! 3. DefaultSource        document compiled into the binary
//! ```
//!
//! The first source that yields a document wins and later sources are not
//! consulted. A source that fails is logged and skipped.

use super::types::StartupConfig;
use super::validate::validate;
use async_trait::async_trait;
use bootlite_shared::errors::{BootError, BootResult};
use std::path::{Path, PathBuf};

/// Default document compiled into the binary.
pub const DEFAULT_DOCUMENT: &str = include_str!("../../assets/startup.json");

/// File name of the persisted override inside the user config directory.
pub const OVERRIDE_FILE_NAME: &str = "startup.json";

/// Application directory under the platform config dir.
pub const APP_CONFIG_DIR: &str = "bootlite";

/// A place a startup document can come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Human-readable source name for logging.
    fn name(&self) -> &str;

    /// Load the document.
    ///
    /// Returns `Ok(None)` when the source has nothing to offer (e.g. no
    /// override has been persisted), which is not an error.
    async fn load(&self) -> BootResult<Option<StartupConfig>>;
}

pub type BoxedSource = Box<dyn ConfigSource>;

/// Persisted override. A missing file means no override.
pub struct OverrideFileSource {
    path: PathBuf,
}

impl OverrideFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Override location in the platform config directory, if one exists.
    pub fn user_default() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join(APP_CONFIG_DIR).join(OVERRIDE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for OverrideFileSource {
    fn name(&self) -> &str {
        "override"
    }

    async fn load(&self) -> BootResult<Option<StartupConfig>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => parse(&text, &self.path).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No persisted startup override");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Static document on disk. A missing file is an error.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> BootResult<Option<StartupConfig>> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BootError::Config(format!(
                "Failed to read startup document at {}: {}",
                self.path.display(),
                e
            ))
        })?;
        parse(&text, &self.path).map(Some)
    }
}

/// Document embedded at build time, or supplied inline.
pub struct DefaultSource {
    text: &'static str,
}

impl DefaultSource {
    pub fn new() -> Self {
        Self {
            text: DEFAULT_DOCUMENT,
        }
    }

    pub fn from_static(text: &'static str) -> Self {
        Self { text }
    }
}

impl Default for DefaultSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigSource for DefaultSource {
    fn name(&self) -> &str {
        "default"
    }

    async fn load(&self) -> BootResult<Option<StartupConfig>> {
        StartupConfig::from_json(self.text).map(Some)
    }
}

fn parse(text: &str, path: &Path) -> BootResult<StartupConfig> {
    StartupConfig::from_json(text).map_err(|e| {
        BootError::Config(format!(
            "Failed to parse startup document at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Conventional source stack: user override, optional static file, embedded default.
pub fn default_sources(static_path: Option<&Path>) -> Vec<BoxedSource> {
    let mut sources: Vec<BoxedSource> = Vec::new();
    if let Some(source) = OverrideFileSource::user_default() {
        sources.push(Box::new(source));
    }
    if let Some(path) = static_path {
        sources.push(Box::new(FileSource::new(path)));
    }
    sources.push(Box::new(DefaultSource::new()));
    sources
}

/// Resolve the startup configuration from an ordered list of sources.
///
/// The chosen document is validated before it is returned; a document that
/// fails validation is an error rather than a reason to fall through, since
/// it was the one the user asked for.
///
/// # Errors
///
/// Returns `BootError::Config` if no source yields a document or the chosen
/// document fails validation.
pub async fn load_startup_config(sources: &[BoxedSource]) -> BootResult<StartupConfig> {
    for source in sources {
        match source.load().await {
            Ok(Some(config)) => {
                let report = validate(&config)?;
                report.log();
                tracing::info!(
                    source = source.name(),
                    phases = config.phases().len(),
                    "Loaded startup configuration"
                );
                return Ok(config);
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(
                    source = source.name(),
                    error = %e,
                    "Startup configuration source failed, trying next"
                );
            }
        }
    }

    Err(BootError::Config(
        "no configuration source produced a startup document".into(),
    ))
}
