//! AR(1) estimation on differenced ratio series.
//!
//! For a series `Y(t)` the estimator fits
//! `ΔY(t) = c + φ₁ ΔY(t−1) + … + φ_p ΔY(t−p) + ε(t)`
//! and reports φ₁ with its inference and the implied half-life.

use crate::error::{ArError, Result};
use crate::ols::fit_ols;
use hobart_panel::RatioPanel;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, info};

/// Configuration for AR estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArConfig {
    /// Autoregressive lag order (default: 1)
    pub ar_order: usize,
    /// Differencing lag (default: 1)
    pub diff_order: usize,
    /// Differenced-series standard deviation below which a series is
    /// considered constant (default: 1e-15)
    pub min_sigma: f64,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            ar_order: 1,
            diff_order: 1,
            min_sigma: 1e-15,
        }
    }
}

impl ArConfig {
    /// Check lag orders and threshold.
    pub fn validate(&self) -> Result<()> {
        if self.ar_order == 0 {
            return Err(ArError::InvalidConfig("ar_order must be at least 1".into()));
        }
        if self.diff_order == 0 {
            return Err(ArError::InvalidConfig(
                "diff_order must be at least 1".into(),
            ));
        }
        if !(self.min_sigma >= 0.0) {
            return Err(ArError::InvalidConfig(
                "min_sigma must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Non-missing raw observations needed before differencing.
    pub const fn min_raw_observations(&self) -> usize {
        self.ar_order + self.diff_order + 3
    }

    /// Differenced (and regression) observations needed.
    pub const fn min_diff_observations(&self) -> usize {
        self.ar_order + 3
    }
}

/// Fit statistics of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArFit {
    /// Lag-1 coefficient
    pub phi1: f64,
    /// Standard error of `phi1`
    pub phi1_se: f64,
    /// Two-sided p-value of `phi1`, undefined for an exact zero fit
    pub phi1_pval: Option<f64>,
    /// Intercept
    pub c: f64,
    /// Centred R², undefined for a constant response
    pub r_squared: Option<f64>,
    /// Sample standard deviation of the differenced series
    pub sigma_diff: f64,
    /// Periods for a shock to halve, when `0 < phi1 < 1`
    pub half_life: Option<f64>,
    /// Regression observations
    pub n_obs: usize,
}

/// Estimate for one (ticker, ratio) pair. Field order is the feature table
/// column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ar1Estimate {
    /// Ticker
    pub ticker: String,
    /// Ratio name
    pub ratio: String,
    /// Lag-1 coefficient
    pub phi1: f64,
    /// Standard error of `phi1`
    pub phi1_se: f64,
    /// Two-sided p-value of `phi1`, undefined for an exact zero fit
    pub phi1_pval: Option<f64>,
    /// Intercept
    pub c: f64,
    /// Centred R², undefined for a constant response
    pub r_squared: Option<f64>,
    /// Sample standard deviation of the differenced series
    pub sigma_diff: f64,
    /// Half-life in quarters, empty when not applicable
    pub half_life: Option<f64>,
    /// Regression observations
    pub n_obs: usize,
}

impl Ar1Estimate {
    /// Attach identifiers to a fit.
    pub fn new(ticker: impl Into<String>, ratio: impl Into<String>, fit: ArFit) -> Self {
        Self {
            ticker: ticker.into(),
            ratio: ratio.into(),
            phi1: fit.phi1,
            phi1_se: fit.phi1_se,
            phi1_pval: fit.phi1_pval,
            c: fit.c,
            r_squared: fit.r_squared,
            sigma_diff: fit.sigma_diff,
            half_life: fit.half_life,
            n_obs: fit.n_obs,
        }
    }
}

/// Half-life of a shock under AR coefficient `phi`.
///
/// Defined only for `0 < phi < 1`.
pub fn half_life(phi: f64) -> Option<f64> {
    (phi > 0.0 && phi < 1.0).then(|| 0.5_f64.ln() / phi.abs().ln())
}

/// Lag-`lag` differences on positions, dropping pairs with a missing side.
pub fn difference(values: &[Option<f64>], lag: usize) -> Vec<f64> {
    if lag == 0 {
        return values.iter().flatten().copied().collect();
    }
    values
        .iter()
        .skip(lag)
        .zip(values)
        .filter_map(|(current, previous)| Some((*current)? - (*previous)?))
        .collect()
}

/// Fit the AR model on the differenced series of `values`.
///
/// `values` are ordered by quarter and may contain missing entries. Returns
/// `None` when the series is too short, constant after differencing, or the
/// regression cannot be fitted.
pub fn fit_ar_on_diff(values: &[Option<f64>], config: &ArConfig) -> Option<ArFit> {
    let p = config.ar_order;

    let observed = values.iter().flatten().count();
    if observed < config.min_raw_observations() {
        return None;
    }

    let diffs = difference(values, config.diff_order);
    if diffs.len() < config.min_diff_observations() {
        return None;
    }

    let sigma_diff = diffs.iter().std_dev();
    if !(sigma_diff >= config.min_sigma) {
        return None;
    }

    let n = diffs.len() - p;
    if n < config.min_diff_observations() {
        return None;
    }

    let y = Array1::from_iter(diffs[p..].iter().copied());
    let mut x = Array2::<f64>::ones((n, p + 1));
    for row in 0..n {
        let t = row + p;
        for lag in 1..=p {
            x[[row, lag]] = diffs[t - lag];
        }
    }

    let fit = match fit_ols(&x, &y) {
        Ok(fit) => fit,
        Err(err) => {
            debug!(%err, "AR regression failed");
            return None;
        }
    };

    let phi1 = fit.params[1];
    Some(ArFit {
        phi1,
        phi1_se: fit.std_errors[1],
        phi1_pval: Some(fit.p_values[1]).filter(|p| p.is_finite()),
        c: fit.params[0],
        r_squared: fit.r_squared,
        sigma_diff,
        half_life: half_life(phi1),
        n_obs: fit.n_obs,
    })
}

/// Estimates for every (ticker, ratio) pair that could be fitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    estimates: Vec<Ar1Estimate>,
}

impl FeatureTable {
    /// Wrap estimates.
    pub fn new(estimates: Vec<Ar1Estimate>) -> Self {
        Self { estimates }
    }

    /// Estimates in ticker-then-ratio order.
    pub fn estimates(&self) -> &[Ar1Estimate] {
        &self.estimates
    }

    /// Consume the table.
    pub fn into_estimates(self) -> Vec<Ar1Estimate> {
        self.estimates
    }

    /// Number of estimates.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Whether no pair produced an estimate.
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Estimates of one ratio.
    pub fn for_ratio<'a>(&'a self, ratio: &'a str) -> impl Iterator<Item = &'a Ar1Estimate> {
        self.estimates.iter().filter(move |e| e.ratio == ratio)
    }
}

/// Runs the AR fit over a whole panel.
#[derive(Debug, Clone, Default)]
pub struct ArEstimator {
    config: ArConfig,
}

impl ArEstimator {
    /// Create an estimator.
    pub const fn new(config: ArConfig) -> Self {
        Self { config }
    }

    /// Configuration.
    pub const fn config(&self) -> &ArConfig {
        &self.config
    }

    /// Fit one series.
    pub fn fit(&self, values: &[Option<f64>]) -> Option<ArFit> {
        fit_ar_on_diff(values, &self.config)
    }

    /// Estimate every (ticker, ratio) pair of `panel`.
    pub fn estimate_panel(&self, panel: &RatioPanel) -> Result<FeatureTable> {
        self.estimate_panel_with(panel, |_| {})
    }

    /// Estimate every pair, calling `observer` after each ticker.
    ///
    /// Tickers are visited in lexical order, ratios in panel column order.
    pub fn estimate_panel_with<F>(&self, panel: &RatioPanel, mut observer: F) -> Result<FeatureTable>
    where
        F: FnMut(&str),
    {
        self.config.validate()?;

        let ratios = panel.ratio_names();
        let series = ratios
            .iter()
            .map(|ratio| panel.series_by_ticker(ratio))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut estimates = Vec::new();
        let mut skipped = 0usize;
        for ticker in panel.tickers()? {
            for (ratio, by_ticker) in ratios.iter().zip(&series) {
                let fit = by_ticker
                    .get(&ticker)
                    .and_then(|s| self.fit(&s.values));
                match fit {
                    Some(fit) => estimates.push(Ar1Estimate::new(ticker.as_str(), ratio.as_str(), fit)),
                    None => {
                        debug!(ticker = %ticker, ratio = %ratio, "No estimate");
                        skipped += 1;
                    }
                }
            }
            observer(&ticker);
        }

        info!(estimates = estimates.len(), skipped, "AR estimation complete");
        Ok(FeatureTable::new(estimates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    /// Levels whose first differences follow `Δ(t) = phi Δ(t−1) + ε(t)`.
    fn ar_levels(phi: f64, n: usize, seed: u64) -> Vec<Option<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut level = 1.0;
        let mut delta = 0.0;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            delta = phi * delta + rng.gen_range(-0.01..0.01);
            level += delta;
            out.push(Some(level));
        }
        out
    }

    #[test]
    fn test_recovers_phi() {
        let values = ar_levels(0.5, 2000, 7);
        let fit = fit_ar_on_diff(&values, &ArConfig::default()).unwrap();

        assert!((fit.phi1 - 0.5).abs() < 0.1, "phi1 = {}", fit.phi1);
        assert!(fit.phi1_pval.unwrap() < 0.05);
        let hl = fit.half_life.unwrap();
        assert_relative_eq!(hl, 0.5_f64.ln() / fit.phi1.ln(), epsilon = 1e-12);
        assert!(hl > 0.7 && hl < 1.4, "half-life = {hl}");
        assert_eq!(fit.n_obs, 1998);
    }

    #[test]
    fn test_short_quarterly_series() {
        let values = ar_levels(0.5, 100, 11);
        let fit = fit_ar_on_diff(&values, &ArConfig::default()).unwrap();

        assert_eq!(fit.n_obs, 98);
        assert!(fit.phi1_se > 0.0);
        let r2 = fit.r_squared.unwrap();
        assert!((0.0..=1.0).contains(&r2));
    }

    #[test]
    fn test_constant_series_is_skipped() {
        let values = vec![Some(0.25); 100];
        assert!(fit_ar_on_diff(&values, &ArConfig::default()).is_none());
    }

    #[test]
    fn test_linear_trend_is_skipped() {
        // Constant first difference
        let values: Vec<Option<f64>> = (0..100).map(|i| Some(i as f64 * 0.5)).collect();
        assert!(fit_ar_on_diff(&values, &ArConfig::default()).is_none());
    }

    #[test]
    fn test_estimate_is_scale_free() {
        let base = ar_levels(0.5, 100, 11);
        let reference = fit_ar_on_diff(&base, &ArConfig::default()).unwrap();

        for scale in [1e-2, 1e-6, 1e-8] {
            let scaled: Vec<Option<f64>> = base.iter().map(|v| v.map(|x| x * scale)).collect();
            let fit = fit_ar_on_diff(&scaled, &ArConfig::default()).unwrap();

            assert_relative_eq!(fit.phi1, reference.phi1, max_relative = 1e-6);
            assert_relative_eq!(
                fit.phi1_pval.unwrap(),
                reference.phi1_pval.unwrap(),
                max_relative = 1e-4
            );
            assert_eq!(fit.n_obs, reference.n_obs);
        }
    }

    #[test]
    fn test_flat_after_first_step_is_estimated() {
        // Levels held at a bound after the first quarter: ΔY = [1, 0, 0, ...]
        let mut values = vec![Some(2.0); 100];
        values[0] = Some(1.0);

        let fit = fit_ar_on_diff(&values, &ArConfig::default()).unwrap();

        assert_eq!(fit.phi1, 0.0);
        assert_eq!(fit.c, 0.0);
        assert_eq!(fit.phi1_pval, None);
        assert_eq!(fit.r_squared, None);
        assert_eq!(fit.half_life, None);
        assert_eq!(fit.n_obs, 98);
        assert!(fit.sigma_diff > 0.0);
    }

    #[rstest]
    #[case(4, false)]
    #[case(5, false)]
    #[case(6, true)]
    fn test_minimum_raw_observations(#[case] observed: usize, #[case] fits: bool) {
        let mut values = vec![None; 100];
        let levels = [1.0, 3.0, 2.0, 5.0, 4.5, 6.0];
        for (i, v) in levels.iter().take(observed).enumerate() {
            values[i] = Some(*v);
        }
        assert_eq!(
            fit_ar_on_diff(&values, &ArConfig::default()).is_some(),
            fits
        );
    }

    #[test]
    fn test_sparse_series_differences() {
        // Differences only where both neighbours are present
        let values = vec![Some(1.0), None, Some(2.0), Some(4.0), Some(7.0), None, Some(1.0)];
        assert_eq!(difference(&values, 1), vec![2.0, 3.0]);
        assert_eq!(difference(&values, 2), vec![1.0, 5.0, -6.0]);
    }

    #[rstest]
    #[case(0.5, Some(1.0))]
    #[case(0.25, Some(0.5))]
    #[case(0.0, None)]
    #[case(-0.3, None)]
    #[case(1.0, None)]
    #[case(1.2, None)]
    #[case(f64::NAN, None)]
    fn test_half_life(#[case] phi: f64, #[case] expected: Option<f64>) {
        match (half_life(phi), expected) {
            (Some(hl), Some(exp)) => assert_relative_eq!(hl, exp, epsilon = 1e-12),
            (None, None) => {}
            (got, exp) => panic!("half_life({phi}) = {got:?}, expected {exp:?}"),
        }
    }

    #[test]
    fn test_negative_phi_has_no_half_life() {
        let values = ar_levels(-0.6, 500, 3);
        let fit = fit_ar_on_diff(&values, &ArConfig::default()).unwrap();

        assert!(fit.phi1 < 0.0);
        assert_eq!(fit.half_life, None);
    }

    #[test]
    fn test_higher_ar_order() {
        let config = ArConfig {
            ar_order: 2,
            ..Default::default()
        };
        let values = ar_levels(0.5, 400, 5);
        let fit = fit_ar_on_diff(&values, &config).unwrap();

        assert_eq!(fit.n_obs, 397);
        assert!((fit.phi1 - 0.5).abs() < 0.2);
    }

    #[test]
    fn test_invalid_config() {
        let config = ArConfig {
            ar_order: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ArConfig::default().validate().is_ok());
    }
}
