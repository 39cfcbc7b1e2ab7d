//! The ratio panel table.
//!
//! Long format: one row per (ticker, quarter) with the ratio columns
//! alongside. Backed by a polars [`DataFrame`].

use crate::error::{PanelError, Result};
use hobart_data::Quarter;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Ticker column name.
pub const TICKER_COLUMN: &str = "ticker";

/// Quarter column name.
pub const QUARTER_COLUMN: &str = "quarter";

/// One ticker's series for a single ratio, ordered by quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSeries {
    /// Quarters, ascending
    pub quarters: Vec<Quarter>,
    /// Ratio values aligned with `quarters`
    pub values: Vec<Option<f64>>,
}

/// Descriptive statistics of one ratio column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioDescription {
    /// Ratio name
    pub ratio: String,
    /// Non-missing observations
    pub count: usize,
    /// Mean
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    /// Minimum
    pub min: Option<f64>,
    /// 25th percentile
    pub q25: Option<f64>,
    /// Median
    pub median: Option<f64>,
    /// 75th percentile
    pub q75: Option<f64>,
    /// Maximum
    pub max: Option<f64>,
}

/// Long-format ratio panel.
///
/// Invariant: columns are `ticker`, `quarter`, then one `Float64` column per
/// ratio, and each (ticker, quarter) pair appears at most once.
#[derive(Debug, Clone)]
pub struct RatioPanel {
    frame: DataFrame,
    ratios: Vec<String>,
}

impl RatioPanel {
    /// Wrap a frame, checking the panel invariants.
    pub fn new(frame: DataFrame, ratios: Vec<String>) -> Result<Self> {
        let panel = Self { frame, ratios };
        panel.validate()?;
        Ok(panel)
    }

    /// Build a panel from column vectors.
    pub fn from_columns(
        tickers: Vec<String>,
        quarters: Vec<Quarter>,
        ratios: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let quarters: Vec<String> = quarters.iter().map(ToString::to_string).collect();
        let mut columns = vec![
            Column::new(TICKER_COLUMN.into(), tickers),
            Column::new(QUARTER_COLUMN.into(), quarters),
        ];
        let mut names = Vec::with_capacity(ratios.len());
        for (name, values) in ratios {
            columns.push(Column::new(name.as_str().into(), values));
            names.push(name);
        }
        Self::new(DataFrame::new(columns)?, names)
    }

    fn validate(&self) -> Result<()> {
        for name in [TICKER_COLUMN, QUARTER_COLUMN] {
            let column = self
                .frame
                .column(name)
                .map_err(|_| PanelError::MissingColumn(name.to_string()))?;
            if column.dtype() != &DataType::String {
                return Err(PanelError::InvalidConfig(format!(
                    "column {name} must be a string column, found {}",
                    column.dtype()
                )));
            }
        }
        for name in &self.ratios {
            let column = self
                .frame
                .column(name)
                .map_err(|_| PanelError::MissingColumn(name.clone()))?;
            if column.dtype() != &DataType::Float64 {
                return Err(PanelError::InvalidConfig(format!(
                    "ratio column {name} must be Float64, found {}",
                    column.dtype()
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for (ticker, quarter) in self.keys()? {
            if !seen.insert((ticker, quarter)) {
                return Err(PanelError::InvalidConfig(format!(
                    "duplicate panel row for {ticker} {quarter}"
                )));
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<impl Iterator<Item = (&str, &str)>> {
        let tickers = self.frame.column(TICKER_COLUMN)?.as_materialized_series().str()?;
        let quarters = self.frame.column(QUARTER_COLUMN)?.as_materialized_series().str()?;
        Ok(tickers
            .into_iter()
            .zip(quarters)
            .map(|(t, q)| (t.unwrap_or_default(), q.unwrap_or_default())))
    }

    /// Underlying frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the panel, returning the frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Ratio column names, in column order.
    pub fn ratio_names(&self) -> &[String] {
        &self.ratios
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the panel has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Distinct tickers, sorted.
    pub fn tickers(&self) -> Result<Vec<String>> {
        let tickers: BTreeSet<&str> = self.keys()?.map(|(t, _)| t).collect();
        Ok(tickers.into_iter().map(String::from).collect())
    }

    /// Values of `ratio` for every ticker, each series ordered by quarter.
    ///
    /// Row order in the frame does not matter.
    pub fn series_by_ticker(&self, ratio: &str) -> Result<BTreeMap<String, TickerSeries>> {
        if !self.ratios.iter().any(|r| r == ratio) {
            return Err(PanelError::MissingColumn(ratio.to_string()));
        }
        let values = self.frame.column(ratio)?.as_materialized_series().f64()?;

        let mut grouped: BTreeMap<String, BTreeMap<Quarter, Option<f64>>> = BTreeMap::new();
        for ((ticker, quarter), value) in self.keys()?.zip(values) {
            let quarter: Quarter = quarter.parse()?;
            grouped
                .entry(ticker.to_string())
                .or_default()
                .insert(quarter, value);
        }

        Ok(grouped
            .into_iter()
            .map(|(ticker, by_quarter)| {
                let (quarters, values) = by_quarter.into_iter().unzip();
                (ticker, TickerSeries { quarters, values })
            })
            .collect())
    }

    /// Count, mean, std, min, quartiles and max of every ratio column.
    pub fn describe(&self) -> Result<Vec<RatioDescription>> {
        self.ratios
            .iter()
            .map(|name| {
                let c = || col(name.as_str());
                let stats = self
                    .frame
                    .clone()
                    .lazy()
                    .select([
                        c().count().cast(DataType::Float64).alias("count"),
                        c().mean().alias("mean"),
                        c().std(1).alias("std"),
                        c().min().cast(DataType::Float64).alias("min"),
                        c().quantile(lit(0.25), QuantileMethod::Linear).alias("q25"),
                        c().quantile(lit(0.5), QuantileMethod::Linear).alias("median"),
                        c().quantile(lit(0.75), QuantileMethod::Linear).alias("q75"),
                        c().max().cast(DataType::Float64).alias("max"),
                    ])
                    .collect()?;

                let get = |stat: &str| -> Result<Option<f64>> {
                    let series = stats
                        .column(stat)?
                        .as_materialized_series()
                        .cast(&DataType::Float64)?;
                    Ok(series.f64()?.get(0))
                };

                Ok(RatioDescription {
                    ratio: name.clone(),
                    count: get("count")?.unwrap_or(0.0) as usize,
                    mean: get("mean")?,
                    std: get("std")?,
                    min: get("min")?,
                    q25: get("q25")?,
                    median: get("median")?,
                    q75: get("q75")?,
                    max: get("max")?,
                })
            })
            .collect()
    }

    /// Write the panel as CSV with a header row. Missing values are empty fields.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        let mut frame = self.frame.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)?;

        info!(path = %path.display(), rows = self.height(), "Ratio panel written");
        Ok(())
    }

    /// Read a panel written by [`RatioPanel::write_csv`].
    ///
    /// Every column other than `ticker` and `quarter` is read as a ratio.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let keys = Schema::from_iter([
            Field::new(TICKER_COLUMN.into(), DataType::String),
            Field::new(QUARTER_COLUMN.into(), DataType::String),
        ]);

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_schema_overwrite(Some(Arc::new(keys)))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let ratios: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .filter(|n| n.as_str() != TICKER_COLUMN && n.as_str() != QUARTER_COLUMN)
            .map(|n| n.to_string())
            .collect();

        let casts: Vec<Expr> = ratios
            .iter()
            .map(|n| col(n.as_str()).cast(DataType::Float64))
            .collect();
        let frame = if casts.is_empty() {
            frame
        } else {
            frame.lazy().with_columns(casts).collect()?
        };

        info!(path = %path.display(), rows = frame.height(), "Ratio panel read");
        Self::new(frame, ratios)
    }
}
