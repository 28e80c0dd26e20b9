//! `transitscan` command-line front end.
//!
//! # Usage
//!
//! ```bash
//! # Human-readable report
//! transitscan analyze kepler-10.csv
//!
//! # JSON result (camelCase keys) written to a file, custom thresholds
//! transitscan analyze tess.dat --json --out result.json --snr-threshold 7
//!
//! # Show how a file is parsed, as clean time,flux CSV
//! transitscan parse messy.txt
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use transitscan_core::{
    AnalysisStatus, LightCurveReader, PipelineParams, ProcessingStep, ProgressObserver,
    RandomChi2, TransitPipeline,
};

#[derive(Parser)]
#[command(name = "transitscan")]
#[command(about = "Search stellar light curves for periodic transits", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full transit search on a light-curve file
    Analyze {
        /// CSV, TXT or DAT light curve
        file: PathBuf,
        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// JSON file with pipeline parameter overrides
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of ranked periods to report
        #[arg(long)]
        candidates: Option<usize>,
        #[arg(long)]
        power_threshold: Option<f64>,
        #[arg(long)]
        snr_threshold: Option<f64>,
        /// Write the output here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse a light-curve file and print the cleaned samples
    Parse {
        file: PathBuf,
    },
}

/// Prints progress lines to stderr.
struct StderrProgress;

impl ProgressObserver for StderrProgress {
    fn on_status(&mut self, status: AnalysisStatus) {
        match status {
            AnalysisStatus::Complete => eprintln!("[100%] done"),
            AnalysisStatus::Error => eprintln!("[ ERR] analysis failed"),
            _ => {}
        }
    }

    fn on_step(&mut self, step: ProcessingStep, percent: u8) {
        eprintln!("[{:>3}%] {}", percent, step.description());
    }

    fn on_warning(&mut self, message: &str) {
        eprintln!("[WARN] {}", message);
    }
}

fn write_output(out: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(stdout)?;
            }
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(LevelFilter::INFO),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            json,
            config,
            candidates,
            power_threshold,
            snr_threshold,
            out,
        } => {
            let mut params = match config {
                Some(path) => PipelineParams::from_path(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => PipelineParams::default(),
            };
            if let Some(n) = candidates {
                params.candidate_count = n;
            }
            if let Some(x) = power_threshold {
                params.power_threshold = x;
            }
            if let Some(x) = snr_threshold {
                params.snr_threshold = x;
            }

            let pipeline = TransitPipeline::new(params);
            let result = pipeline
                .analyze_file_with(&file, &mut StderrProgress, &mut RandomChi2)
                .with_context(|| format!("failed to analyse {}", file.display()))?;

            let text = if json {
                result.to_json().context("failed to serialise result")?
            } else {
                result.summary()
            };
            write_output(out.as_ref(), &text)?;
        }
        Commands::Parse { file } => {
            let parsed = LightCurveReader::new()
                .read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            eprintln!(
                "{} samples from {} rows via {:?}",
                parsed.curve.len(),
                parsed.rows_seen,
                parsed.strategy
            );
            write_output(None, &parsed.curve.to_csv())?;
        }
    }

    Ok(())
}
