//! Statement sources and quarter alignment.
//!
//! Each ticker has one CSV per statement type. A source is read once, its
//! dated rows are mapped onto calendar quarters inside the configured year
//! range, and when several filings land in the same quarter the latest one
//! wins (restatements supersede earlier filings).

use crate::error::Result;
use crate::quarter::{CanonicalQuarterIndex, Quarter, YearRange};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Columns that carry filing metadata rather than statement values.
pub const METADATA_COLUMNS: [&str; 4] = ["date", "filing_date", "currency_symbol", "symbol"];

/// Name of the column holding the period date.
pub const DATE_COLUMN: &str = "date";

/// Financial statement type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// Income statement
    #[display("income")]
    Income,
    /// Balance sheet
    #[display("balance")]
    Balance,
    /// Cash flow statement
    #[display("cashflow")]
    Cashflow,
}

impl StatementKind {
    /// All statement types required for a company.
    pub const ALL: [Self; 3] = [Self::Income, Self::Balance, Self::Cashflow];
}

/// Locations of the per-ticker source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLayout {
    /// Income statement CSVs
    pub income: PathBuf,
    /// Balance sheet CSVs
    pub balance: PathBuf,
    /// Cash flow statement CSVs
    pub cashflow: PathBuf,
    /// Company profile CSVs (symbol and sector)
    pub profile: PathBuf,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self::from_raw_dir(Path::new("data").join("raw"))
    }
}

impl SourceLayout {
    /// Standard layout below a raw-data directory.
    pub fn from_raw_dir(raw: impl AsRef<Path>) -> Self {
        let raw = raw.as_ref();
        Self {
            income: raw.join("income_statements"),
            balance: raw.join("balance_sheets"),
            cashflow: raw.join("cashflows"),
            profile: raw.join("profiles"),
        }
    }

    /// Directory holding the sources for a statement type.
    pub fn statement_dir(&self, kind: StatementKind) -> &Path {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::Cashflow => &self.cashflow,
        }
    }

    /// Path of a ticker's source for a statement type.
    pub fn statement_path(&self, kind: StatementKind, ticker: &str) -> PathBuf {
        self.statement_dir(kind).join(format!("{ticker}.csv"))
    }
}

#[derive(Debug, Clone)]
struct QuarterRow {
    date: NaiveDate,
    values: Vec<Option<f64>>,
}

/// One company's statement values aligned onto calendar quarters.
///
/// Holds at most one row per quarter, restricted to the configured years.
#[derive(Debug, Clone)]
pub struct CompanySourceTable {
    kind: StatementKind,
    columns: Vec<String>,
    rows: BTreeMap<Quarter, QuarterRow>,
}

impl CompanySourceTable {
    /// Statement type of this table.
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Numeric field names (metadata columns stripped).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the table has a field named `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Number of quarters with a row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no quarter has a row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Quarters with a row, in order.
    pub fn quarters(&self) -> impl Iterator<Item = &Quarter> {
        self.rows.keys()
    }

    /// Whether `quarter` has a row.
    pub fn has_quarter(&self, quarter: &Quarter) -> bool {
        self.rows.contains_key(quarter)
    }

    /// Date of the filing kept for `quarter`.
    pub fn filing_date(&self, quarter: &Quarter) -> Option<NaiveDate> {
        self.rows.get(quarter).map(|row| row.date)
    }

    /// Value of `column` in `quarter`, if present and numeric.
    pub fn value(&self, quarter: &Quarter, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(quarter)?.values[idx]
    }

    /// Values of `column` re-indexed onto `index`.
    ///
    /// Returns `None` if the column does not exist. Quarters without a row
    /// yield missing values.
    pub fn field(&self, column: &str, index: &CanonicalQuarterIndex) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(column)?;
        Some(
            index
                .iter()
                .map(|q| self.rows.get(q).and_then(|row| row.values[idx]))
                .collect(),
        )
    }

    /// Canonical quarters that have no row in this table.
    pub fn missing_quarters<'a>(
        &'a self,
        index: &'a CanonicalQuarterIndex,
    ) -> impl Iterator<Item = &'a Quarter> + 'a {
        index.iter().filter(|q| !self.rows.contains_key(q))
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Load and align a ticker's source file.
///
/// Returns `Ok(None)` when the file does not exist, has no date column, or has
/// no data rows. The file is closed before returning.
pub fn load_source(
    path: &Path,
    kind: StatementKind,
    years: &YearRange,
) -> Result<Option<CompanySourceTable>> {
    if !path.is_file() {
        return Ok(None);
    }
    let file = std::fs::File::open(path)?;
    read_source(file, kind, years)
}

/// Align dated statement rows from any CSV reader onto calendar quarters.
pub fn read_source<R: Read>(
    reader: R,
    kind: StatementKind,
    years: &YearRange,
) -> Result<Option<CompanySourceTable>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let Some(date_idx) = headers.iter().position(|h| h == DATE_COLUMN) else {
        return Ok(None);
    };

    let value_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !METADATA_COLUMNS.contains(h))
        .map(|(i, _)| i)
        .collect();
    let columns = value_idx.iter().map(|&i| headers[i].to_string()).collect();

    let mut n_records = 0usize;
    let mut rows: BTreeMap<Quarter, QuarterRow> = BTreeMap::new();

    for record in rdr.records() {
        let record = record?;
        n_records += 1;

        let Some(date) = record.get(date_idx).and_then(parse_date) else {
            continue;
        };
        if !years.contains(chrono::Datelike::year(&date)) {
            continue;
        }

        let values = value_idx
            .iter()
            .map(|&i| record.get(i).and_then(parse_numeric))
            .collect();

        let quarter = Quarter::from_date(date);
        // Later filings supersede; on equal dates the later row wins.
        let keep = rows.get(&quarter).is_none_or(|existing| date >= existing.date);
        if keep {
            rows.insert(quarter, QuarterRow { date, values });
        }
    }

    if n_records == 0 {
        return Ok(None);
    }

    Ok(Some(CompanySourceTable {
        kind,
        columns,
        rows,
    }))
}

/// Parse a date cell. Unparseable dates yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Coerce a cell to a finite number; anything else is missing.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn quarter(s: &str) -> Quarter {
        s.parse().unwrap()
    }

    fn read(csv: &str) -> Option<CompanySourceTable> {
        read_source(csv.as_bytes(), StatementKind::Income, &YearRange::default()).unwrap()
    }

    #[test]
    fn test_latest_filing_wins() {
        let table = read(
            "date,symbol,netIncome\n\
             2013-04-30,AAA,1.0\n\
             2013-06-30,AAA,2.0\n\
             2013-05-15,AAA,3.0\n",
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.value(&quarter("2013Q2"), "netIncome"), Some(2.0));
        assert_eq!(
            table.filing_date(&quarter("2013Q2")),
            NaiveDate::from_ymd_opt(2013, 6, 30)
        );
    }

    #[test]
    fn test_equal_dates_keep_later_row() {
        let table = read("date,netIncome\n2013-06-30,1.0\n2013-06-30,5.0\n").unwrap();
        assert_eq!(table.value(&quarter("2013Q2"), "netIncome"), Some(5.0));
    }

    #[test]
    fn test_year_range_and_bad_dates_are_dropped() {
        let table = read(
            "date,netIncome\n\
             1999-12-31,1.0\n\
             not-a-date,2.0\n\
             2000-03-31,3.0\n\
             2025-03-31,4.0\n",
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.has_quarter(&quarter("2000Q1")));
    }

    #[test]
    fn test_metadata_stripped_and_values_coerced() {
        let table = read(
            "date,filing_date,currency_symbol,symbol,netIncome,totalRevenue\n\
             2010-09-30,2010-11-01,USD,AAA,abc,100\n",
        )
        .unwrap();

        assert_eq!(table.columns(), &["netIncome", "totalRevenue"]);
        assert_eq!(table.value(&quarter("2010Q3"), "netIncome"), None);
        assert_eq!(table.value(&quarter("2010Q3"), "totalRevenue"), Some(100.0));
    }

    #[test]
    fn test_absent_sources() {
        assert!(read("").is_none());
        assert!(read("period,netIncome\n2010-01-01,1\n").is_none());
        assert!(read("date,netIncome\n").is_none());

        let missing = load_source(
            Path::new("/definitely/not/here/AAA.csv"),
            StatementKind::Balance,
            &YearRange::default(),
        )
        .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_rows_outside_range_leave_empty_table() {
        let table = read("date,netIncome\n1995-03-31,1.0\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_field_reindexes_onto_canonical_quarters() {
        let table = read("date,netIncome\n2000-03-31,1.0\n2000-09-30,3.0\n").unwrap();
        let index = CanonicalQuarterIndex::new(&YearRange::default()).unwrap();

        let field = table.field("netIncome", &index).unwrap();
        assert_eq!(field.len(), 100);
        assert_eq!(&field[..4], &[Some(1.0), None, Some(3.0), None]);
        assert!(table.field("ebit", &index).is_none());
        assert_eq!(table.missing_quarters(&index).count(), 98);
    }

    #[rstest]
    #[case("2013-06-30", Some((2013, 6, 30)))]
    #[case("2013/06/30", Some((2013, 6, 30)))]
    #[case("2013-06-30 00:00:00", Some((2013, 6, 30)))]
    #[case("2013-06-30T12:00:00+00:00", Some((2013, 6, 30)))]
    #[case("06/30/2013", Some((2013, 6, 30)))]
    #[case("3/31/2014", Some((2014, 3, 31)))]
    #[case("13/01/2013", None)]
    #[case("30.06.2013", None)]
    #[case("", None)]
    fn test_parse_date(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_date(raw), expected);
    }

    #[rstest]
    #[case("1.5", Some(1.5))]
    #[case(" -2e3 ", Some(-2000.0))]
    #[case("", None)]
    #[case("n/a", None)]
    #[case("inf", None)]
    #[case("NaN", None)]
    fn test_parse_numeric(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_numeric(raw), expected);
    }
}
