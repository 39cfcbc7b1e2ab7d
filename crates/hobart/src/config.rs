//! Pipeline configuration.
//!
//! One immutable value carrying every component's settings. Loaded from JSON;
//! fields left out of the file take their defaults.

use hobart_ar::{ArConfig, SummaryConfig};
use hobart_output::{ExportFormat, OutputLayout};
use hobart_panel::PanelConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid setting
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of a full run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Panel construction
    pub panel: PanelConfig,
    /// AR estimation
    pub ar: ArConfig,
    /// Per-ratio summary
    pub summary: SummaryConfig,
    /// Artifact locations
    pub output: OutputLayout,
    /// Format of the feature and summary tables
    pub format: ExportFormat,
}

impl PipelineConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON representation.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every component's settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.panel
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.ar
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !(self.summary.significance > 0.0 && self.summary.significance < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "summary significance must be in (0, 1), got {}",
                self.summary.significance
            )));
        }
        Ok(())
    }
}
