//! Hobart CLI binary.
//!
//! Builds the quarterly ratio panel, estimates AR(1) dynamics per
//! ticker-ratio series and summarizes them by ratio.

mod integration;

use clap::{Parser, Subcommand};
use hobart::PipelineConfig;
use hobart::ar::{ArEstimator, FeatureTable, RatioSummary, summarize_by_ratio};
use hobart::output::{AsciiTable, RunReportBuilder};
use hobart::panel::{PanelAssembler, PanelBuildReport, RatioPanel, TickerOutcome};
use hobart::pipeline::{self, PipelineOutputs};
use integration::console::{banner, init_tracing, progress_bar};
use integration::settings::Settings;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: mean-reversion dynamics of financial ratios", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build and write the winsorized ratio panel
    Panel,

    /// Estimate AR(1) features from a persisted panel
    Estimate {
        /// Panel CSV (default: <output-dir>/ratios/ratio_panel.csv)
        #[arg(long)]
        panel: Option<PathBuf>,
    },

    /// Build the panel, estimate features and summarize
    Run,

    /// Print the effective configuration
    Config,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.settings.resolve()?;

    match cli.command {
        Commands::Panel => {
            let (panel, report) = build_panel(&config)?;
            panel.write_csv(&config.output.panel_path())?;
            print_panel(&panel, &report)?;
            println!("Panel written to {}", config.output.panel_path().display());
        }
        Commands::Estimate { panel } => {
            let path = panel.unwrap_or_else(|| config.output.panel_path());
            let panel = RatioPanel::read_csv(&path)?;
            println!(
                "Loaded {} rows, {} ratios from {}",
                panel.height(),
                panel.ratio_names().len(),
                path.display()
            );

            let (features, summary) = estimate(&config, &panel)?;
            pipeline::write_estimates(&config, &features, &summary)?;
            RunReportBuilder::new()
                .panel_rows(panel.height())
                .estimates(features.len())
                .summary(summary.clone())
                .build()
                .write(&config.output.run_report_path())?;
            print_summary(&features, &summary);
        }
        Commands::Run => {
            let (panel, report) = build_panel(&config)?;
            print_panel(&panel, &report)?;

            let (features, summary) = estimate(&config, &panel)?;
            print_summary(&features, &summary);

            let outputs = PipelineOutputs {
                panel,
                build: Some(report),
                features,
                summary,
            };
            pipeline::write_artifacts(&config, &outputs)?;
            println!("Artifacts written under {}", config.output.root.display());
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}

fn build_panel(
    config: &PipelineConfig,
) -> Result<(RatioPanel, PanelBuildReport), Box<dyn std::error::Error>> {
    let assembler = PanelAssembler::new(config.panel.clone())?;
    let (candidates, report) = assembler.candidates()?;

    let pb = progress_bar(candidates.len(), "Aligning statements...")?;
    let mut included = 0usize;
    let result = assembler.assemble(&candidates, report, |ticker, outcome| {
        if matches!(outcome, TickerOutcome::Included) {
            included += 1;
        }
        pb.set_message(ticker.to_string());
        pb.inc(1);
    });

    match result {
        Ok((panel, report)) => {
            pb.finish_with_message(format!(
                "{} of {} tickers complete ({} rows)",
                included,
                candidates.len(),
                panel.height()
            ));
            Ok((panel, report))
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn estimate(
    config: &PipelineConfig,
    panel: &RatioPanel,
) -> Result<(FeatureTable, Vec<RatioSummary>), Box<dyn std::error::Error>> {
    let estimator = ArEstimator::new(config.ar);
    let tickers = panel.tickers()?;

    let pb = progress_bar(tickers.len(), "Fitting AR(1)...")?;
    let features = estimator.estimate_panel_with(panel, |ticker| {
        pb.set_message(ticker.to_string());
        pb.inc(1);
    })?;
    pb.finish_with_message(format!(
        "{} estimates over {} tickers",
        features.len(),
        tickers.len()
    ));

    let summary = summarize_by_ratio(&features, &config.summary);
    Ok((features, summary))
}

fn print_panel(
    panel: &RatioPanel,
    report: &PanelBuildReport,
) -> Result<(), Box<dyn std::error::Error>> {
    banner("RATIO PANEL");
    print!("{}", report.to_ascii_table());
    println!();
    print!("{}", panel.describe()?.as_slice().to_ascii_table());
    Ok(())
}

fn print_summary(features: &FeatureTable, summary: &[RatioSummary]) {
    banner("AR(1) SUMMARY BY RATIO");
    println!("Series estimated: {}\n", features.len());
    print!("{}", summary.to_ascii_table());
}
