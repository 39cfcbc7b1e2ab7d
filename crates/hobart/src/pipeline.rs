//! End-to-end run: panel → features → summary → artifacts.

use crate::config::{ConfigError, PipelineConfig};
use hobart_ar::{ArError, ArEstimator, FeatureTable, RatioSummary, summarize_by_ratio};
use hobart_output::{ExportError, Exporter, RunReport, RunReportBuilder};
use hobart_panel::{PanelAssembler, PanelBuildReport, PanelError, RatioPanel};
use thiserror::Error;
use tracing::info;

/// Errors that can stop a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Panel error
    #[error(transparent)]
    Panel(#[from] PanelError),

    /// Estimation error
    #[error(transparent)]
    Ar(#[from] ArError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    /// Winsorized ratio panel
    pub panel: RatioPanel,
    /// Panel build counts, absent when the panel was read from disk
    pub build: Option<PanelBuildReport>,
    /// Per-series estimates
    pub features: FeatureTable,
    /// Per-ratio summary
    pub summary: Vec<RatioSummary>,
}

impl PipelineOutputs {
    /// Run report for these outputs.
    pub fn run_report(&self) -> RunReport {
        let builder = RunReportBuilder::new()
            .panel_rows(self.panel.height())
            .estimates(self.features.len())
            .summary(self.summary.clone());
        match &self.build {
            Some(build) => builder.panel(build.clone()).build(),
            None => builder.build(),
        }
    }
}

/// Build the ratio panel.
pub fn build_panel(config: &PipelineConfig) -> Result<(RatioPanel, PanelBuildReport), PipelineError> {
    let assembler = PanelAssembler::new(config.panel.clone())?;
    Ok(assembler.build()?)
}

/// Estimate and summarize an existing panel.
pub fn estimate(
    config: &PipelineConfig,
    panel: &RatioPanel,
) -> Result<(FeatureTable, Vec<RatioSummary>), PipelineError> {
    let features = ArEstimator::new(config.ar).estimate_panel(panel)?;
    let summary = summarize_by_ratio(&features, &config.summary);
    Ok((features, summary))
}

/// Write the panel, feature table, summary and run report.
pub fn write_artifacts(
    config: &PipelineConfig,
    outputs: &PipelineOutputs,
) -> Result<(), PipelineError> {
    let layout = &config.output;
    outputs.panel.write_csv(&layout.panel_path())?;
    write_estimates(config, &outputs.features, &outputs.summary)?;
    outputs.run_report().write(&layout.run_report_path())?;
    Ok(())
}

/// Write the feature and summary tables in the configured format.
pub fn write_estimates(
    config: &PipelineConfig,
    features: &FeatureTable,
    summary: &[RatioSummary],
) -> Result<(), PipelineError> {
    let layout = &config.output;
    let features_path = layout.features_path(config.format);
    let summary_path = layout.summary_path(config.format);

    features.export_to_file(&features_path, config.format)?;
    summary.export_to_file(&summary_path, config.format)?;

    info!(
        features = %features_path.display(),
        summary = %summary_path.display(),
        "Estimates written"
    );
    Ok(())
}

/// Full run with artifacts written under the configured output root.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutputs, PipelineError> {
    config.validate()?;

    let (panel, build) = build_panel(config)?;
    let (features, summary) = estimate(config, &panel)?;
    let outputs = PipelineOutputs {
        panel,
        build: Some(build),
        features,
        summary,
    };

    write_artifacts(config, &outputs)?;
    Ok(outputs)
}
