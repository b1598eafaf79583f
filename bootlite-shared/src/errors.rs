//! Error taxonomy for bootstrap orchestration.
//!
//! Variants map onto the failure kinds the orchestrator distinguishes:
//! - resolution failures (`Resolution`, `Timeout`)
//! - instantiation failures (`Instantiation`)
//! - dependencies that never became available (`Unresolved`)
//! - malformed configuration (`Config`)
//!
//! Any of the first three is wrapped in `RequiredComponent` when it hits a
//! component marked `required`, which aborts the whole run.

use thiserror::Error;

pub type BootResult<T> = Result<T, BootError>;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to resolve module for '{component}': {reason}")]
    Resolution { component: String, reason: String },

    #[error("timed out resolving module for '{component}' after {timeout_ms}ms")]
    Timeout { component: String, timeout_ms: u64 },

    #[error("failed to instantiate '{component}': {reason}")]
    Instantiation { component: String, reason: String },

    #[error("dependencies of '{component}' never became available: {missing:?}")]
    Unresolved {
        component: String,
        missing: Vec<String>,
    },

    #[error("required component '{component}' failed: {source}")]
    RequiredComponent {
        component: String,
        #[source]
        source: Box<BootError>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BootError {
    /// Create an instantiation error for a component.
    pub fn instantiation(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Create a resolution error for a component.
    pub fn resolution(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure of a required component. The result aborts orchestration.
    pub fn required(component: impl Into<String>, source: BootError) -> Self {
        Self::RequiredComponent {
            component: component.into(),
            source: Box::new(source),
        }
    }

    /// True when this error must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RequiredComponent { .. } | Self::Config(_))
    }

    /// Name of the component this error is about, if any.
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Resolution { component, .. }
            | Self::Timeout { component, .. }
            | Self::Instantiation { component, .. }
            | Self::Unresolved { component, .. }
            | Self::RequiredComponent { component, .. } => Some(component),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_wraps_source() {
        let err = BootError::required(
            "window-manager",
            BootError::Timeout {
                component: "window-manager".into(),
                timeout_ms: 100,
            },
        );

        assert!(err.is_fatal());
        assert_eq!(err.component(), Some("window-manager"));
        let msg = err.to_string();
        assert!(msg.contains("required component 'window-manager'"));
        assert!(msg.contains("100ms"));
    }

    #[test]
    fn test_optional_failures_are_not_fatal() {
        assert!(!BootError::resolution("dock", "not found").is_fatal());
        assert!(!BootError::instantiation("dock", "boom").is_fatal());
        assert!(
            !BootError::Unresolved {
                component: "dock".into(),
                missing: vec!["menu-bar".into()],
            }
            .is_fatal()
        );
    }
}
