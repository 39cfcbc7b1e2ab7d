//! Console tables and the run report.

use chrono::{DateTime, Utc};
use hobart_ar::RatioSummary;
use hobart_panel::{PanelBuildReport, RatioDescription};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::export::ExportError;

/// Render as a fixed-width ASCII table.
pub trait AsciiTable {
    /// Table text, newline terminated.
    fn to_ascii_table(&self) -> String;
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

impl AsciiTable for PanelBuildReport {
    fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nRatio Panel Build\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');

        let rows = [
            ("Ticker universe", self.universe),
            ("Sector labels loaded", self.sector_map),
            ("Removed by sector", self.removed_by_sector.len()),
            ("Completeness candidates", self.candidates),
            ("Passed completeness", self.complete.len()),
            ("Failed completeness", self.incomplete.len()),
            ("Panel rows", self.rows),
        ];
        for (label, value) in rows {
            output.push_str(&format!("{label:<30} {value:>12}\n"));
        }

        if !self.bounds.is_empty() {
            output.push_str(&"-".repeat(60));
            output.push('\n');
            output.push_str(&format!(
                "{:<20} {:>14} {:>14}\n",
                "Winsorize bounds", "Lower", "Upper"
            ));
            for bounds in &self.bounds {
                output.push_str(&format!(
                    "{:<20} {:>14} {:>14}\n",
                    bounds.column,
                    cell(bounds.lower),
                    cell(bounds.upper)
                ));
            }
        }

        output.push_str(&"=".repeat(60));
        output.push('\n');
        output
    }
}

impl AsciiTable for [RatioDescription] {
    fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nRatio Panel Description\n");
        output.push_str(&"=".repeat(96));
        output.push('\n');
        output.push_str(&format!(
            "{:<16} {:>7} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
            "Ratio", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
        ));
        output.push_str(&"-".repeat(96));
        output.push('\n');

        for d in self {
            output.push_str(&format!(
                "{:<16} {:>7} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
                d.ratio,
                d.count,
                cell(d.mean),
                cell(d.std),
                cell(d.min),
                cell(d.q25),
                cell(d.median),
                cell(d.q75),
                cell(d.max)
            ));
        }

        output.push_str(&"=".repeat(96));
        output.push('\n');
        output
    }
}

impl AsciiTable for [RatioSummary] {
    fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nAR(1) Summary by Ratio\n");
        output.push_str(&"=".repeat(98));
        output.push('\n');
        output.push_str(&format!(
            "{:<16} {:>5} {:>10} {:>10} {:>10} {:>9} {:>10} {:>10} {:>10}\n",
            "Ratio", "N", "phi1 mean", "phi1 med", "phi1 std", "signif%", "sigma mean", "sigma med",
            "HL med"
        ));
        output.push_str(&"-".repeat(98));
        output.push('\n');

        for s in self {
            output.push_str(&format!(
                "{:<16} {:>5} {:>10.4} {:>10.4} {:>10} {:>8.2}% {:>10.4} {:>10.4} {:>10}\n",
                s.ratio,
                s.n,
                s.phi1_mean,
                s.phi1_median,
                cell(s.phi1_std),
                s.phi1_signif_pct,
                s.sigma_mean,
                s.sigma_median,
                cell(s.hl_median)
            ));
        }

        output.push_str(&"=".repeat(98));
        output.push('\n');
        output
    }
}

/// Machine-readable record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Panel build counts, absent when the panel was read from disk.
    pub panel: Option<PanelBuildReport>,

    /// Panel rows estimated on.
    pub panel_rows: usize,

    /// Estimates in the feature table.
    pub estimates: usize,

    /// Per-ratio summary.
    pub summary: Vec<RatioSummary>,
}

impl RunReport {
    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builder for creating run reports.
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    panel: Option<PanelBuildReport>,
    panel_rows: usize,
    estimates: usize,
    summary: Vec<RatioSummary>,
}

impl RunReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the panel build report.
    pub fn panel(mut self, report: PanelBuildReport) -> Self {
        self.panel = Some(report);
        self
    }

    /// Set the panel row count.
    pub const fn panel_rows(mut self, rows: usize) -> Self {
        self.panel_rows = rows;
        self
    }

    /// Set the estimate count.
    pub const fn estimates(mut self, estimates: usize) -> Self {
        self.estimates = estimates;
        self
    }

    /// Set the summary.
    pub fn summary(mut self, summary: Vec<RatioSummary>) -> Self {
        self.summary = summary;
        self
    }

    /// Build the report, stamped with the current time.
    pub fn build(self) -> RunReport {
        RunReport {
            timestamp: Utc::now(),
            panel: self.panel,
            panel_rows: self.panel_rows,
            estimates: self.estimates,
            summary: self.summary,
        }
    }
}
