//! Ratio computation for one company.

use crate::ratio::{FieldRef, RatioDefinition};
use hobart_data::{CanonicalQuarterIndex, CompleteSources};
use tracing::debug;

/// Divide, treating a zero or missing denominator as undefined.
///
/// Results that overflow to infinity are undefined as well.
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Compute every ratio over the canonical index.
///
/// Returns one column per ratio (in `ratios` order), each with one value per
/// canonical quarter. A ratio whose numerator or denominator column does not
/// exist in its source is entirely undefined.
pub fn compute_ratios(
    sources: &CompleteSources,
    ratios: &[RatioDefinition],
    index: &CanonicalQuarterIndex,
) -> Vec<Vec<Option<f64>>> {
    ratios
        .iter()
        .map(|ratio| {
            let numerator = field(sources, &ratio.numerator, index);
            let denominator = field(sources, &ratio.denominator, index);

            match (numerator, denominator) {
                (Some(num), Some(den)) => num
                    .into_iter()
                    .zip(den)
                    .map(|(n, d)| safe_divide(n, d))
                    .collect(),
                _ => {
                    debug!(ratio = %ratio.name, "Ratio input column missing, ratio undefined");
                    vec![None; index.len()]
                }
            }
        })
        .collect()
}

fn field(
    sources: &CompleteSources,
    field: &FieldRef,
    index: &CanonicalQuarterIndex,
) -> Option<Vec<Option<f64>>> {
    sources.get(field.source).field(&field.column, index)
}
