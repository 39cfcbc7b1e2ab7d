//! Synthetic statement sources for integration tests.

#![allow(dead_code)]

use hobart_data::{CanonicalQuarterIndex, Quarter, SourceLayout, StatementKind, YearRange};
use std::fs;
use std::path::Path;

/// A synthetic company.
pub struct Company {
    pub ticker: &'static str,
    pub sector: &'static str,
    /// Quarter left out of the cashflow source
    pub cashflow_gap: Option<Quarter>,
    pub seed: f64,
}

fn quarter_end(q: &Quarter) -> String {
    let (month, day) = match q.quarter() {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        _ => (12, 31),
    };
    format!("{}-{:02}-{:02}", q.year(), month, day)
}

/// Write the three statement sources and the profile of `company`.
pub fn write_company(layout: &SourceLayout, company: &Company) {
    let index = CanonicalQuarterIndex::new(&YearRange::default()).unwrap();
    let s = company.seed;

    let mut income = String::from("date,filing_date,currency_symbol,symbol,netIncome,ebit,totalRevenue\n");
    let mut balance = String::from(
        "date,filing_date,currency_symbol,symbol,totalAssets,totalStockholderEquity,totalCurrentAssets,totalCurrentLiabilities,shortLongTermDebtTotal\n",
    );
    let mut cashflow = String::from("date,filing_date,currency_symbol,symbol,freeCashFlow\n");

    for (i, q) in index.iter().enumerate() {
        let t = i as f64;
        let date = quarter_end(q);
        let meta = format!("{date},{date},USD,{}", company.ticker);
        let wave = (t * 0.7 + s).sin();

        let revenue = 1000.0 + 10.0 * t + 50.0 * wave;
        let net_income = 80.0 + 20.0 * (t * 0.3 + s).cos() + 5.0 * wave;
        let assets = 5000.0 + 25.0 * t;
        let equity = 2000.0 + 10.0 * t + 100.0 * wave;

        income.push_str(&format!(
            "{meta},{net_income:.4},{:.4},{revenue:.4}\n",
            net_income * 1.4
        ));
        balance.push_str(&format!(
            "{meta},{assets:.4},{equity:.4},{:.4},{:.4},{:.4}\n",
            1500.0 + 40.0 * wave,
            900.0 + 5.0 * t,
            1200.0 - 3.0 * t + 60.0 * wave
        ));
        if company.cashflow_gap != Some(*q) {
            cashflow.push_str(&format!("{meta},{:.4}\n", 60.0 + 30.0 * wave));
        }
    }

    write(layout.statement_dir(StatementKind::Income), company.ticker, &income);
    write(layout.statement_dir(StatementKind::Balance), company.ticker, &balance);
    write(layout.statement_dir(StatementKind::Cashflow), company.ticker, &cashflow);
    write(
        &layout.profile,
        company.ticker,
        &format!("symbol,sector,industry\n{},{},Widgets\n", company.ticker, company.sector),
    );
}

fn write(dir: &Path, ticker: &str, contents: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{ticker}.csv")), contents).unwrap();
}

/// Three companies: one complete, one with a cashflow gap, one financial.
pub fn three_companies(layout: &SourceLayout) {
    for company in [
        Company {
            ticker: "GOOD",
            sector: "Technology",
            cashflow_gap: None,
            seed: 0.1,
        },
        Company {
            ticker: "GAPPY",
            sector: "Industrials",
            cashflow_gap: Quarter::new(2012, 3),
            seed: 0.7,
        },
        Company {
            ticker: "BANK",
            sector: "Financial Services",
            cashflow_gap: None,
            seed: 1.3,
        },
    ] {
        write_company(layout, &company);
    }
}
