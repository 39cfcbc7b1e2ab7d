//! Ticker universe and sector exclusion.
//!
//! The universe is the set of tickers with a source file in every statement
//! directory. Tickers in excluded sectors (financials, whose leverage is
//! structural rather than a risk signal) are dropped before any alignment.

use crate::error::Result;
use crate::source::{SourceLayout, StatementKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tickers that have a `<TICKER>.csv` file in `dir`.
///
/// A missing directory yields an empty set.
pub fn csv_tickers(dir: &Path) -> Result<BTreeSet<String>> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Source directory not found");
        return Ok(BTreeSet::new());
    }

    let mut tickers = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path.extension().is_some_and(|ext| ext == "csv")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            tickers.insert(stem.to_string());
        }
    }
    Ok(tickers)
}

/// Sorted intersection of the tickers present in all statement directories.
pub fn ticker_universe(layout: &SourceLayout) -> Result<Vec<String>> {
    let mut common: Option<BTreeSet<String>> = None;
    for kind in StatementKind::ALL {
        let tickers = csv_tickers(layout.statement_dir(kind))?;
        common = Some(match common {
            None => tickers,
            Some(acc) => acc.intersection(&tickers).cloned().collect(),
        });
    }

    let universe: Vec<String> = common.unwrap_or_default().into_iter().collect();
    info!(tickers = universe.len(), "Ticker universe (intersection of statement sources)");
    Ok(universe)
}

/// Configuration for sector-based exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorFilter {
    /// Sector labels to exclude (default: financial sector labels)
    pub excluded: BTreeSet<String>,
    /// Profile column holding the ticker (default: "symbol")
    pub symbol_column: String,
    /// Profile column holding the sector (default: "sector")
    pub sector_column: String,
}

impl Default for SectorFilter {
    fn default() -> Self {
        Self {
            excluded: ["Financial Services", "Banks", "Insurance"]
                .into_iter()
                .map(String::from)
                .collect(),
            symbol_column: "symbol".to_string(),
            sector_column: "sector".to_string(),
        }
    }
}

/// Outcome of the sector filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorFilterOutcome {
    /// Tickers kept, in input order
    pub kept: Vec<String>,
    /// Tickers removed, in input order
    pub removed: Vec<String>,
}

impl SectorFilter {
    /// Whether `sector` is excluded.
    pub fn is_excluded(&self, sector: &str) -> bool {
        self.excluded.contains(sector)
    }

    /// Drop tickers whose sector is excluded. Tickers without a sector are kept.
    pub fn apply(&self, tickers: &[String], sectors: &SectorMap) -> SectorFilterOutcome {
        let (removed, kept): (Vec<String>, Vec<String>) = tickers
            .iter()
            .cloned()
            .partition(|t| sectors.sector(t).is_some_and(|s| self.is_excluded(s)));

        info!(
            removed = removed.len(),
            remaining = kept.len(),
            "Sector filter applied"
        );
        SectorFilterOutcome { kept, removed }
    }
}

/// Ticker to sector label, read from company profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorMap {
    sectors: HashMap<String, String>,
}

impl SectorMap {
    /// Read every profile CSV in `dir`.
    ///
    /// Best effort: a profile that cannot be read or lacks the configured
    /// columns leaves its ticker without a sector.
    pub fn load(dir: &Path, filter: &SectorFilter) -> Self {
        let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
                .collect(),
            Err(err) => {
                warn!(dir = %dir.display(), %err, "Profile directory not readable");
                return Self::default();
            }
        };
        paths.sort();

        let mut map = Self::default();
        for path in paths {
            match read_profile(&path, filter) {
                Ok(Some((symbol, sector))) => {
                    map.sectors.insert(symbol, sector);
                }
                Ok(None) => debug!(path = %path.display(), "Profile without symbol/sector"),
                Err(err) => debug!(path = %path.display(), %err, "Profile not readable"),
            }
        }

        info!(profiles = map.len(), "Sector map loaded");
        map
    }

    /// Sector label of `ticker`.
    pub fn sector(&self, ticker: &str) -> Option<&str> {
        self.sectors.get(ticker).map(String::as_str)
    }

    /// Record a sector label.
    pub fn insert(&mut self, ticker: impl Into<String>, sector: impl Into<String>) {
        self.sectors.insert(ticker.into(), sector.into());
    }

    /// Number of tickers with a sector.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Whether no sector is known.
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// First data row's (symbol, sector) of a profile CSV.
fn read_profile(path: &Path, filter: &SectorFilter) -> Result<Option<(String, String)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    let symbol_idx = headers.iter().position(|h| h == filter.symbol_column);
    let sector_idx = headers.iter().position(|h| h == filter.sector_column);
    let (Some(symbol_idx), Some(sector_idx)) = (symbol_idx, sector_idx) else {
        return Ok(None);
    };

    let Some(record) = rdr.records().next().transpose()? else {
        return Ok(None);
    };

    match (record.get(symbol_idx), record.get(sector_idx)) {
        (Some(symbol), Some(sector)) if !symbol.is_empty() => {
            Ok(Some((symbol.to_string(), sector.to_string())))
        }
        _ => Ok(None),
    }
}
