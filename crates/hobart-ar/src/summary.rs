//! Per-ratio aggregation of the feature table.

use crate::estimator::{Ar1Estimate, FeatureTable};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;

/// Configuration for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Decimal places kept (default: 4)
    pub decimals: u32,
    /// p-value below which `phi1` counts as significant (default: 0.05)
    pub significance: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            decimals: 4,
            significance: 0.05,
        }
    }
}

/// Summary of the estimates of one ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSummary {
    /// Ratio name
    pub ratio: String,
    /// Number of estimates
    pub n: usize,
    /// Mean of `phi1`
    pub phi1_mean: f64,
    /// Median of `phi1`
    pub phi1_median: f64,
    /// Sample standard deviation of `phi1`, empty for a single estimate
    pub phi1_std: Option<f64>,
    /// Percentage of estimates with a significant `phi1`
    pub phi1_signif_pct: f64,
    /// Mean of `sigma_diff`
    pub sigma_mean: f64,
    /// Median of `sigma_diff`
    pub sigma_median: f64,
    /// Median half-life over estimates that have one
    pub hl_median: Option<f64>,
}

/// Round `value` to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

fn median(values: Vec<f64>) -> f64 {
    Data::new(values).median()
}

/// Group estimates by ratio (lexical order) and summarize each group.
pub fn summarize_by_ratio(table: &FeatureTable, config: &SummaryConfig) -> Vec<RatioSummary> {
    let mut groups: BTreeMap<&str, Vec<&Ar1Estimate>> = BTreeMap::new();
    for estimate in table.estimates() {
        groups.entry(estimate.ratio.as_str()).or_default().push(estimate);
    }

    let round = |v: f64| round_to(v, config.decimals);
    let defined = |v: f64| v.is_finite().then(|| round(v));

    groups
        .into_iter()
        .map(|(ratio, estimates)| {
            let n = estimates.len();
            let phi1: Vec<f64> = estimates.iter().map(|e| e.phi1).collect();
            let sigma: Vec<f64> = estimates.iter().map(|e| e.sigma_diff).collect();
            let half_lives: Vec<f64> = estimates.iter().filter_map(|e| e.half_life).collect();
            let significant = estimates
                .iter()
                .filter(|e| e.phi1_pval.is_some_and(|p| p < config.significance))
                .count();

            RatioSummary {
                ratio: ratio.to_string(),
                n,
                phi1_mean: round(phi1.iter().mean()),
                phi1_std: defined(phi1.iter().std_dev()),
                phi1_median: round(median(phi1)),
                phi1_signif_pct: round(100.0 * significant as f64 / n as f64),
                sigma_mean: round(sigma.iter().mean()),
                sigma_median: round(median(sigma)),
                hl_median: if half_lives.is_empty() {
                    None
                } else {
                    defined(median(half_lives))
                },
            }
        })
        .collect()
}
