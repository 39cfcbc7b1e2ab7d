//! Command-line overrides on top of the JSON configuration.

use clap::Args;
use hobart::PipelineConfig;
use hobart::data::SourceLayout;
use hobart::output::{ExportFormat, OutputLayout};
use hobart::ConfigError;
use std::path::PathBuf;

/// Options shared by every subcommand.
#[derive(Debug, Default, Args)]
pub(crate) struct Settings {
    /// JSON configuration file
    #[arg(long, short, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Data root containing raw/{income,balance,cashflow,profile}
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,

    /// Output root for the panel, feature tables and run report
    #[arg(long, global = true)]
    pub(crate) output_dir: Option<PathBuf>,

    /// Table format (csv, json or pretty-json)
    #[arg(long, global = true)]
    pub(crate) format: Option<ExportFormat>,
}

impl Settings {
    /// Effective configuration: file (or defaults), then flags, then validation.
    pub(crate) fn resolve(&self) -> Result<PipelineConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.panel.layout = SourceLayout::from_raw_dir(dir.join("raw"));
        }
        if let Some(dir) = &self.output_dir {
            config.output = OutputLayout::new(dir);
        }
        if let Some(format) = self.format {
            config.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}
