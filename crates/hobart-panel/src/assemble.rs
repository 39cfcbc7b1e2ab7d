//! Panel Assembler
//!
//! Orchestrates universe → sector filter → alignment → completeness →
//! ratios → concatenation → winsorization into one [`RatioPanel`].

use crate::compute::compute_ratios;
use crate::error::{PanelError, Result};
use crate::panel::RatioPanel;
use crate::ratio::{RatioDefinition, default_ratios, ratio_names};
use crate::winsorize::{ColumnBounds, WinsorizeConfig, apply_bounds, compute_bounds};
use hobart_data::{
    CanonicalQuarterIndex, CompleteSources, Incompleteness, SectorFilter, SectorMap,
    SourceLayout, StatementSources, YearRange, ticker_universe,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Configuration for panel construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Source directory layout
    pub layout: SourceLayout,
    /// Year range of the canonical index
    pub years: YearRange,
    /// Sector exclusion
    pub sectors: SectorFilter,
    /// Ratios to compute, in column order
    pub ratios: Vec<RatioDefinition>,
    /// Winsorization quantiles
    pub winsorize: WinsorizeConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            layout: SourceLayout::default(),
            years: YearRange::default(),
            sectors: SectorFilter::default(),
            ratios: default_ratios(),
            winsorize: WinsorizeConfig::default(),
        }
    }
}

impl PanelConfig {
    /// Check the year range, quantiles and ratio set.
    pub fn validate(&self) -> Result<()> {
        CanonicalQuarterIndex::new(&self.years)?;
        self.winsorize.validate()?;

        if self.ratios.is_empty() {
            return Err(PanelError::InvalidConfig(
                "at least one ratio is required".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for ratio in &self.ratios {
            if !names.insert(ratio.name.as_str()) {
                return Err(PanelError::InvalidConfig(format!(
                    "duplicate ratio name: {}",
                    ratio.name
                )));
            }
        }
        Ok(())
    }
}

/// What happened to one candidate ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    /// Passed the completeness filter, rows added to the panel
    Included,
    /// Failed the completeness filter
    Incomplete(Incompleteness),
    /// A source file exists but could not be read
    Unreadable(String),
}

impl fmt::Display for TickerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Included => write!(f, "included"),
            Self::Incomplete(reason) => write!(f, "incomplete: {reason}"),
            Self::Unreadable(err) => write!(f, "unreadable: {err}"),
        }
    }
}

/// Per-stage counts of a panel build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelBuildReport {
    /// Tickers with a file in every statement directory
    pub universe: usize,
    /// Tickers with a known sector
    pub sector_map: usize,
    /// Tickers removed by the sector filter
    pub removed_by_sector: Vec<String>,
    /// Tickers that reached the completeness filter
    pub candidates: usize,
    /// Tickers in the panel
    pub complete: Vec<String>,
    /// Tickers dropped by the completeness filter (including unreadable sources)
    pub incomplete: Vec<String>,
    /// Panel rows
    pub rows: usize,
    /// Winsorization bounds applied
    pub bounds: Vec<ColumnBounds>,
}

/// Builds the ratio panel from raw statement sources.
#[derive(Debug, Clone)]
pub struct PanelAssembler {
    config: PanelConfig,
    index: CanonicalQuarterIndex,
}

impl PanelAssembler {
    /// Create an assembler, validating `config`.
    pub fn new(config: PanelConfig) -> Result<Self> {
        config.validate()?;
        let index = CanonicalQuarterIndex::new(&config.years)?;
        Ok(Self { config, index })
    }

    /// Configuration.
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Canonical quarter index.
    pub fn index(&self) -> &CanonicalQuarterIndex {
        &self.index
    }

    /// Tickers that will reach the completeness filter: the universe minus
    /// excluded sectors.
    pub fn candidates(&self) -> Result<(Vec<String>, PanelBuildReport)> {
        let universe = ticker_universe(&self.config.layout)?;
        let sectors = SectorMap::load(&self.config.layout.profile, &self.config.sectors);
        let filtered = self.config.sectors.apply(&universe, &sectors);

        let report = PanelBuildReport {
            universe: universe.len(),
            sector_map: sectors.len(),
            removed_by_sector: filtered.removed,
            candidates: filtered.kept.len(),
            ..Default::default()
        };
        Ok((filtered.kept, report))
    }

    /// Build the panel.
    pub fn build(&self) -> Result<(RatioPanel, PanelBuildReport)> {
        self.build_with(|_, _| {})
    }

    /// Build the panel, calling `observer` once per candidate ticker.
    ///
    /// Fails only when no ticker passes the completeness filter.
    pub fn build_with<F>(&self, observer: F) -> Result<(RatioPanel, PanelBuildReport)>
    where
        F: FnMut(&str, &TickerOutcome),
    {
        let (candidates, report) = self.candidates()?;
        self.assemble(&candidates, report, observer)
    }

    /// Run the completeness filter over `candidates` and build the panel from
    /// the survivors. `report` carries the counts of the earlier stages.
    pub fn assemble<F>(
        &self,
        candidates: &[String],
        mut report: PanelBuildReport,
        mut observer: F,
    ) -> Result<(RatioPanel, PanelBuildReport)>
    where
        F: FnMut(&str, &TickerOutcome),
    {
        report.candidates = candidates.len();
        let names = ratio_names(&self.config.ratios);

        let mut tickers = Vec::new();
        let mut quarters = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];

        for ticker in candidates {
            let outcome = match self.complete_sources(ticker) {
                Ok(sources) => {
                    let ratios = compute_ratios(&sources, &self.config.ratios, &self.index);
                    for (column, values) in columns.iter_mut().zip(ratios) {
                        column.extend(values);
                    }
                    tickers.extend(std::iter::repeat_n(ticker.clone(), self.index.len()));
                    quarters.extend(self.index.iter().copied());
                    report.complete.push(ticker.clone());
                    TickerOutcome::Included
                }
                Err(outcome) => {
                    report.incomplete.push(ticker.clone());
                    outcome
                }
            };
            observer(ticker, &outcome);
        }

        info!(
            candidates = candidates.len(),
            complete = report.complete.len(),
            incomplete = report.incomplete.len(),
            "Completeness filter applied"
        );

        if report.complete.is_empty() {
            return Err(PanelError::NoCompleteTickers {
                candidates: candidates.len(),
            });
        }

        let panel = RatioPanel::from_columns(
            tickers,
            quarters,
            names.iter().cloned().zip(columns).collect(),
        )?;

        let bounds = compute_bounds(panel.frame(), &names, &self.config.winsorize)?;
        let frame = apply_bounds(panel.into_frame(), &bounds)?;
        let panel = RatioPanel::new(frame, names)?;

        report.rows = panel.height();
        report.bounds = bounds;
        info!(
            tickers = report.complete.len(),
            rows = report.rows,
            "Ratio panel assembled"
        );
        Ok((panel, report))
    }

    /// Align the three sources of `ticker` and apply the completeness filter.
    fn complete_sources(&self, ticker: &str) -> std::result::Result<CompleteSources, TickerOutcome> {
        let sources = StatementSources::load(&self.config.layout, ticker, &self.config.years)
            .map_err(|err| {
                warn!(ticker, %err, "Statement source not readable");
                TickerOutcome::Unreadable(err.to_string())
            })?;

        CompleteSources::check(sources, &self.index).map_err(|reason| {
            debug!(ticker, %reason, "Excluded by completeness filter");
            TickerOutcome::Incomplete(reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PanelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = PanelConfig::default();
        config.years = YearRange {
            start: 2024,
            end: 2000,
        };
        assert!(config.validate().is_err());

        let mut config = PanelConfig::default();
        config.ratios.clear();
        assert!(matches!(
            config.validate(),
            Err(PanelError::InvalidConfig(_))
        ));

        let mut config = PanelConfig::default();
        let dup = config.ratios[0].clone();
        config.ratios.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_universe_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PanelConfig {
            layout: SourceLayout::from_raw_dir(tmp.path()),
            ..Default::default()
        };
        let assembler = PanelAssembler::new(config).unwrap();

        assert!(matches!(
            assembler.build(),
            Err(PanelError::NoCompleteTickers { candidates: 0 })
        ));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(TickerOutcome::Included.to_string(), "included");
        assert!(
            TickerOutcome::Unreadable("bad".into())
                .to_string()
                .starts_with("unreadable")
        );
    }
}
