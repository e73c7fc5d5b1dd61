use std::time::Duration;
use thiserror::Error;

/// Why a metric source could not produce a sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
    #[error("{tool} not installed")]
    ToolNotFound { tool: String, hint: Option<String> },
    #[error("{tool} failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },
    #[error("{metric} unavailable: {reason}")]
    SampleUnavailable { metric: String, reason: String },
    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: String, after: Duration },
}

impl SampleError {
    pub fn unavailable(metric: &str, reason: impl Into<String>) -> Self {
        Self::SampleUnavailable {
            metric: metric.to_string(),
            reason: reason.into(),
        }
    }

    pub fn tool_failed(tool: &str, reason: impl Into<String>) -> Self {
        Self::ToolExecutionFailed {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    /// Fatal errors end the poller that hit them; everything else is skipped for one tick.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::ToolNotFound { .. }
        )
    }

    pub fn is_retryable(&self) -> bool {
        !self.is_fatal()
    }

    /// One-line message shown in place of a graph.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::ToolNotFound {
                hint: Some(hint), ..
            } => format!("{self} ({hint})"),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("graph needs at least one cell, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("invalid graph range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config location: set TSM_CONFIG, XDG_CONFIG_HOME or HOME")]
    NoLocation,
}
