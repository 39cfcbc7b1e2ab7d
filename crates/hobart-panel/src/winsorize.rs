//! Pooled winsorization of ratio columns.
//!
//! Bounds are computed per column over every ticker-quarter in the panel
//! (not per ticker, not per quarter), then values are clipped to them.
//! Missing values stay missing and are ignored when computing the bounds.

use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for winsorization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinsorizeConfig {
    /// Lower quantile (default: 0.01)
    pub lower: f64,
    /// Upper quantile (default: 0.99)
    pub upper: f64,
}

impl Default for WinsorizeConfig {
    fn default() -> Self {
        Self {
            lower: 0.01,
            upper: 0.99,
        }
    }
}

impl WinsorizeConfig {
    /// Check that `0 <= lower < upper <= 1`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.lower)
            || !(0.0..=1.0).contains(&self.upper)
            || self.lower >= self.upper
        {
            return Err(PanelError::InvalidConfig(format!(
                "winsorize quantiles must satisfy 0 <= lower < upper <= 1, got {} and {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

/// Clipping bounds of one column. `None` when the column has no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBounds {
    /// Column name
    pub column: String,
    /// Lower bound
    pub lower: Option<f64>,
    /// Upper bound
    pub upper: Option<f64>,
}

/// Compute pooled quantile bounds for `columns` (linear interpolation).
pub fn compute_bounds(
    df: &DataFrame,
    columns: &[String],
    config: &WinsorizeConfig,
) -> Result<Vec<ColumnBounds>> {
    config.validate()?;
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let exprs: Vec<Expr> = columns
        .iter()
        .flat_map(|name| {
            [
                col(name.as_str())
                    .quantile(lit(config.lower), QuantileMethod::Linear)
                    .alias(format!("{name}_lower")),
                col(name.as_str())
                    .quantile(lit(config.upper), QuantileMethod::Linear)
                    .alias(format!("{name}_upper")),
            ]
        })
        .collect();

    let quantiles = df.clone().lazy().select(exprs).collect()?;

    columns
        .iter()
        .map(|name| {
            let bounds = ColumnBounds {
                column: name.clone(),
                lower: scalar(&quantiles, &format!("{name}_lower"))?,
                upper: scalar(&quantiles, &format!("{name}_upper"))?,
            };
            debug!(column = %name, lower = ?bounds.lower, upper = ?bounds.upper, "Winsorize bounds");
            Ok(bounds)
        })
        .collect()
}

/// Clip each bounded column to its bounds.
///
/// Re-applying the same bounds leaves the frame unchanged.
pub fn apply_bounds(df: DataFrame, bounds: &[ColumnBounds]) -> Result<DataFrame> {
    let exprs: Vec<Expr> = bounds
        .iter()
        .filter_map(|b| {
            let (lower, upper) = (b.lower?, b.upper?);
            let name = b.column.as_str();
            Some(
                when(col(name).lt(lit(lower)))
                    .then(lit(lower))
                    .when(col(name).gt(lit(upper)))
                    .then(lit(upper))
                    .otherwise(col(name))
                    .alias(name),
            )
        })
        .collect();

    if exprs.is_empty() {
        return Ok(df);
    }
    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// Compute bounds on `df` and clip it to them.
pub fn winsorize(
    df: DataFrame,
    columns: &[String],
    config: &WinsorizeConfig,
) -> Result<(DataFrame, Vec<ColumnBounds>)> {
    let bounds = compute_bounds(&df, columns, config)?;
    let df = apply_bounds(df, &bounds)?;
    Ok((df, bounds))
}

fn scalar(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    let values = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.get(0))
}
