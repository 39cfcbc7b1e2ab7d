//! Completeness filter.
//!
//! A company enters the panel only if each required statement supplies a row
//! for every canonical quarter. One missing quarter in one statement excludes
//! the company; nothing is interpolated.

use crate::error::Result;
use crate::quarter::{CanonicalQuarterIndex, Quarter, YearRange};
use crate::source::{CompanySourceTable, SourceLayout, StatementKind, load_source};
use std::fmt;

/// The three statement sources of one ticker, each possibly absent.
#[derive(Debug, Clone, Default)]
pub struct StatementSources {
    /// Income statement
    pub income: Option<CompanySourceTable>,
    /// Balance sheet
    pub balance: Option<CompanySourceTable>,
    /// Cash flow statement
    pub cashflow: Option<CompanySourceTable>,
}

impl StatementSources {
    /// Load and align all three sources of `ticker`.
    pub fn load(layout: &SourceLayout, ticker: &str, years: &YearRange) -> Result<Self> {
        let load = |kind| load_source(&layout.statement_path(kind, ticker), kind, years);
        Ok(Self {
            income: load(StatementKind::Income)?,
            balance: load(StatementKind::Balance)?,
            cashflow: load(StatementKind::Cashflow)?,
        })
    }

    /// Source for a statement type, if present.
    pub const fn get(&self, kind: StatementKind) -> Option<&CompanySourceTable> {
        match kind {
            StatementKind::Income => self.income.as_ref(),
            StatementKind::Balance => self.balance.as_ref(),
            StatementKind::Cashflow => self.cashflow.as_ref(),
        }
    }

    /// Mutable access to a source slot.
    pub const fn slot_mut(&mut self, kind: StatementKind) -> &mut Option<CompanySourceTable> {
        match kind {
            StatementKind::Income => &mut self.income,
            StatementKind::Balance => &mut self.balance,
            StatementKind::Cashflow => &mut self.cashflow,
        }
    }
}

/// Why a company failed the completeness filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incompleteness {
    /// A statement source is missing or empty.
    Absent(StatementKind),
    /// A statement source lacks some canonical quarters.
    MissingQuarters {
        /// Statement with the gap
        kind: StatementKind,
        /// Number of canonical quarters without a row
        missing: usize,
        /// First quarter without a row
        first: Quarter,
    },
}

impl fmt::Display for Incompleteness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent(kind) => write!(f, "{kind} source absent"),
            Self::MissingQuarters {
                kind,
                missing,
                first,
            } => write!(f, "{kind} source missing {missing} quarter(s), first {first}"),
        }
    }
}

/// Statement sources that passed the completeness filter.
///
/// Can only be obtained through [`CompleteSources::check`], so holders know
/// every canonical quarter has a row in all three statements.
#[derive(Debug, Clone)]
pub struct CompleteSources {
    income: CompanySourceTable,
    balance: CompanySourceTable,
    cashflow: CompanySourceTable,
}

impl CompleteSources {
    /// Apply the completeness filter.
    pub fn check(
        sources: StatementSources,
        index: &CanonicalQuarterIndex,
    ) -> std::result::Result<Self, Incompleteness> {
        let StatementSources {
            income,
            balance,
            cashflow,
        } = sources;

        Ok(Self {
            income: require(StatementKind::Income, income, index)?,
            balance: require(StatementKind::Balance, balance, index)?,
            cashflow: require(StatementKind::Cashflow, cashflow, index)?,
        })
    }

    /// Source for a statement type.
    pub const fn get(&self, kind: StatementKind) -> &CompanySourceTable {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::Cashflow => &self.cashflow,
        }
    }
}

fn require(
    kind: StatementKind,
    table: Option<CompanySourceTable>,
    index: &CanonicalQuarterIndex,
) -> std::result::Result<CompanySourceTable, Incompleteness> {
    let table = table.ok_or(Incompleteness::Absent(kind))?;

    let gap = {
        let mut missing = table.missing_quarters(index);
        missing.next().map(|first| (*first, 1 + missing.count()))
    };

    match gap {
        Some((first, missing)) => Err(Incompleteness::MissingQuarters {
            kind,
            missing,
            first,
        }),
        None => Ok(table),
    }
}

/// Whether all three sources are present and cover every canonical quarter.
pub fn is_complete(sources: &StatementSources, index: &CanonicalQuarterIndex) -> bool {
    StatementKind::ALL.iter().all(|&kind| {
        sources
            .get(kind)
            .is_some_and(|table| table.missing_quarters(index).next().is_none())
    })
}
