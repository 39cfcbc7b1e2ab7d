//! Export of the feature and summary tables.
//!
//! CSV output has one header row and one record per estimate or ratio.
//! Undefined values (`None`) are written as empty fields.

use hobart_ar::{Ar1Estimate, FeatureTable, RatioSummary};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not UTF-8.
    #[error("Encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Locations of the run artifacts under an output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    /// Output root directory
    pub root: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new("output")
    }
}

impl OutputLayout {
    /// Layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/ratios/ratio_panel.csv`
    pub fn panel_path(&self) -> PathBuf {
        self.root.join("ratios").join("ratio_panel.csv")
    }

    /// `<root>/ar/ar_features.<ext>`
    pub fn features_path(&self, format: ExportFormat) -> PathBuf {
        self.root
            .join("ar")
            .join(format!("ar_features.{}", format.extension()))
    }

    /// `<root>/ar/ar_summary_by_ratio.<ext>`
    pub fn summary_path(&self, format: ExportFormat) -> PathBuf {
        self.root
            .join("ar")
            .join(format!("ar_summary_by_ratio.{}", format.extension()))
    }

    /// `<root>/run_report.json`
    pub fn run_report_path(&self) -> PathBuf {
        self.root.join("run_report.json")
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_string<T: Serialize>(
    records: &[T],
    header: &[&str],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(!records.is_empty())
                .from_writer(vec![]);
            if records.is_empty() {
                wtr.write_record(header)?;
            }
            for record in records {
                wtr.serialize(record)?;
            }
            let data = String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?)?;
            Ok(data)
        }
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

/// Feature table columns.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "ticker",
    "ratio",
    "phi1",
    "phi1_se",
    "phi1_pval",
    "c",
    "r_squared",
    "sigma_diff",
    "half_life",
    "n_obs",
];

/// Summary table columns.
pub const SUMMARY_COLUMNS: [&str; 9] = [
    "ratio",
    "n",
    "phi1_mean",
    "phi1_median",
    "phi1_std",
    "phi1_signif_pct",
    "sigma_mean",
    "sigma_median",
    "hl_median",
];

impl Exporter for [Ar1Estimate] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, &FEATURE_COLUMNS, format)
    }
}

impl Exporter for FeatureTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.estimates().export_to_string(format)
    }
}

impl Exporter for [RatioSummary] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, &SUMMARY_COLUMNS, format)
    }
}

impl Exporter for Vec<RatioSummary> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.as_slice().export_to_string(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn estimate(ticker: &str, half_life: Option<f64>) -> Ar1Estimate {
        Ar1Estimate {
            ticker: ticker.to_string(),
            ratio: "ROA".to_string(),
            phi1: 0.5,
            phi1_se: 0.1,
            phi1_pval: Some(0.001),
            c: -0.002,
            r_squared: Some(0.25),
            sigma_diff: 0.03,
            half_life,
            n_obs: 98,
        }
    }

    fn summary() -> RatioSummary {
        RatioSummary {
            ratio: "ROA".to_string(),
            n: 1,
            phi1_mean: 0.5,
            phi1_median: 0.5,
            phi1_std: None,
            phi1_signif_pct: 100.0,
            sigma_mean: 0.03,
            sigma_median: 0.03,
            hl_median: Some(1.0),
        }
    }

    #[test]
    fn test_feature_csv_columns() {
        let table = FeatureTable::new(vec![estimate("AAA", Some(1.0)), estimate("BBB", None)]);
        let csv = table.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], FEATURE_COLUMNS.join(","));
        assert_eq!(lines[1], "AAA,ROA,0.5,0.1,0.001,-0.002,0.25,0.03,1.0,98");
        // Undefined half-life is an empty field
        assert_eq!(lines[2], "BBB,ROA,0.5,0.1,0.001,-0.002,0.25,0.03,,98");
    }

    #[test]
    fn test_undefined_inference_is_empty() {
        let mut exact = estimate("CCC", None);
        exact.phi1 = 0.0;
        exact.phi1_se = 0.0;
        exact.phi1_pval = None;
        exact.r_squared = None;
        let csv = FeatureTable::new(vec![exact])
            .export_to_string(ExportFormat::Csv)
            .unwrap();

        assert_eq!(csv.lines().nth(1), Some("CCC,ROA,0.0,0.0,,-0.002,,0.03,,98"));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let csv = FeatureTable::default()
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert_eq!(csv.trim_end(), FEATURE_COLUMNS.join(","));
    }

    #[test]
    fn test_summary_csv_columns() {
        let csv = vec![summary()].export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], SUMMARY_COLUMNS.join(","));
        assert_eq!(lines[1], "ROA,1,0.5,0.5,,100.0,0.03,0.03,1.0");
    }

    #[test]
    fn test_json_export() {
        let json = vec![summary()].export_to_string(ExportFormat::Json).unwrap();
        let parsed: Vec<RatioSummary> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![summary()]);

        let pretty = vec![summary()]
            .export_to_string(ExportFormat::PrettyJson)
            .unwrap();
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn test_export_to_file_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(tmp.path());
        let path = layout.features_path(ExportFormat::Csv);

        FeatureTable::new(vec![estimate("AAA", None)])
            .export_to_file(&path, ExportFormat::Csv)
            .unwrap();

        assert!(path.ends_with("ar/ar_features.csv"));
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("ticker,ratio"));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_format_from_str(#[case] raw: &str, #[case] expected: ExportFormat) {
        assert_eq!(raw.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::default();
        assert_eq!(layout.panel_path(), PathBuf::from("output/ratios/ratio_panel.csv"));
        assert_eq!(
            layout.summary_path(ExportFormat::Json),
            PathBuf::from("output/ar/ar_summary_by_ratio.json")
        );
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
