//! Ratio Registry
//!
//! The financial ratios tracked by the panel. Each ratio is a numerator field
//! divided by a denominator field, each taken from a named statement source.

use derive_more::Display;
use hobart_data::StatementKind;
use serde::{Deserialize, Serialize};

/// Ratio categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum RatioCategory {
    /// Profitability ratios (ROA, ROE, margins)
    #[display("Profitability")]
    Profitability,
    /// Liquidity ratios (current ratio)
    #[display("Liquidity")]
    Liquidity,
    /// Capital structure ratios (leverage, equity ratio)
    #[display("Capital Structure")]
    CapitalStructure,
}

/// A statement field: column name plus the statement it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Column in the source CSV
    pub column: String,
    /// Statement holding the column
    pub source: StatementKind,
}

impl FieldRef {
    /// Create a field reference.
    pub fn new(column: impl Into<String>, source: StatementKind) -> Self {
        Self {
            column: column.into(),
            source,
        }
    }
}

/// Definition of one financial ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioDefinition {
    /// Short name, used as the panel column name
    pub name: String,
    /// Display label
    pub label: String,
    /// Ratio category
    pub category: RatioCategory,
    /// Numerator field
    pub numerator: FieldRef,
    /// Denominator field
    pub denominator: FieldRef,
}

impl RatioDefinition {
    fn new(
        name: &str,
        label: &str,
        category: RatioCategory,
        numerator: (&str, StatementKind),
        denominator: (&str, StatementKind),
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            category,
            numerator: FieldRef::new(numerator.0, numerator.1),
            denominator: FieldRef::new(denominator.0, denominator.1),
        }
    }
}

/// The seven default ratios, in panel column order.
pub fn default_ratios() -> Vec<RatioDefinition> {
    use RatioCategory::*;
    use StatementKind::*;

    vec![
        // Profitability
        RatioDefinition::new(
            "ROA",
            "Return on Assets",
            Profitability,
            ("netIncome", Income),
            ("totalAssets", Balance),
        ),
        RatioDefinition::new(
            "ROE",
            "Return on Equity",
            Profitability,
            ("netIncome", Income),
            ("totalStockholderEquity", Balance),
        ),
        RatioDefinition::new(
            "EBIT_margin",
            "EBIT Margin",
            Profitability,
            ("ebit", Income),
            ("totalRevenue", Income),
        ),
        RatioDefinition::new(
            "fcf_margin",
            "Free Cash Flow Margin",
            Profitability,
            ("freeCashFlow", Cashflow),
            ("totalRevenue", Income),
        ),
        // Liquidity
        RatioDefinition::new(
            "current_ratio",
            "Current Ratio",
            Liquidity,
            ("totalCurrentAssets", Balance),
            ("totalCurrentLiabilities", Balance),
        ),
        // Capital structure
        RatioDefinition::new(
            "debt_to_equity",
            "Debt-to-Equity",
            CapitalStructure,
            ("shortLongTermDebtTotal", Balance),
            ("totalStockholderEquity", Balance),
        ),
        RatioDefinition::new(
            "equity_ratio",
            "Equity Ratio",
            CapitalStructure,
            ("totalStockholderEquity", Balance),
            ("totalAssets", Balance),
        ),
    ]
}

/// Names of `ratios`, in order.
pub fn ratio_names(ratios: &[RatioDefinition]) -> Vec<String> {
    ratios.iter().map(|r| r.name.clone()).collect()
}

/// Ratios belonging to a category.
pub fn ratios_by_category(
    ratios: &[RatioDefinition],
    category: RatioCategory,
) -> Vec<&RatioDefinition> {
    ratios.iter().filter(|r| r.category == category).collect()
}

/// Look up a ratio by name.
pub fn get_ratio<'a>(ratios: &'a [RatioDefinition], name: &str) -> Option<&'a RatioDefinition> {
    ratios.iter().find(|r| r.name == name)
}
