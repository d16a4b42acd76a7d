#![warn(missing_docs)]
//! Gauge CLI Library
//!
//! Command line harness for benchmark binaries. Build a [`Session`], then hand
//! it to [`run`] from `main`:
//!
//! ```ignore
//! use gauge::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut session = Session::new();
//!     session.register("sum", Work::sync(|t| t.iter(|| (0..64u64).sum::<u64>())))?;
//!     gauge::run(session)
//! }
//! ```

mod config;

pub use config::*;

use clap::{Parser, Subcommand};
use gauge_core::{Completion, RunOptions, Session, drive};
use gauge_report::{OutputFormat, Report, ReportMeta, render};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

/// Gauge CLI arguments
#[derive(Parser, Debug)]
#[command(name = "gauge")]
#[command(author, version, about = "Gauge - adaptive micro-benchmark harness")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter benchmarks by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Output format: human, json (default from gauge.toml)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Measurement target per benchmark, e.g. "500ms" (default from gauge.toml)
    #[arg(long)]
    pub duration: Option<String>,

    /// Advisory per-trial timeout, e.g. "3s" (default from gauge.toml)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered benchmarks
    List,
    /// Run benchmarks (default)
    Run,
    /// Write a default gauge.toml into the current directory
    Init,
}

/// Everything a run needs, resolved from `gauge.toml` and CLI flags
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Benchmarks whose name does not match are skipped
    pub filter: Regex,
    /// Duration target and timeout
    pub options: RunOptions,
    /// Report format
    pub format: OutputFormat,
    /// Report destination; stdout when `None`
    pub output: Option<PathBuf>,
    /// Show a progress bar on stderr
    pub progress: bool,
}

impl RunSettings {
    /// Layer CLI flags over configuration file values
    pub fn resolve(cli: &Cli, config: &GaugeConfig) -> anyhow::Result<Self> {
        let duration = cli.duration.as_deref().unwrap_or(&config.runner.duration);
        let timeout = cli.timeout.as_deref().unwrap_or(&config.runner.timeout);
        let format = cli.format.as_deref().unwrap_or(&config.output.format);

        let options = RunOptions {
            duration: Duration::from_nanos(GaugeConfig::parse_duration(duration)?),
            timeout: Duration::from_nanos(GaugeConfig::parse_duration(timeout)?),
        };

        Ok(Self {
            filter: Regex::new(&cli.filter)?,
            options,
            format: format.parse().map_err(anyhow::Error::msg)?,
            output: cli.output.clone(),
            progress: true,
        })
    }
}

/// Run the gauge CLI over `session`.
/// This is the main entry point for benchmark binaries.
///
/// Asynchronous benchmarks need their completion tokens routed back; use
/// [`run_with_completions`] for those.
///
/// # Returns
/// Returns an error if any benchmark failed or the report could not be written.
pub fn run(session: Session) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(tx);
    run_with_completions(session, rx)
}

/// Run the gauge CLI over `session`, receiving asynchronous completions on `completions`.
pub fn run_with_completions(
    session: Session,
    completions: UnboundedReceiver<Completion>,
) -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli, session, completions)
}

/// Run the gauge CLI with pre-parsed arguments.
pub fn run_with_cli(
    cli: Cli,
    mut session: Session,
    completions: UnboundedReceiver<Completion>,
) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    // Discover gauge.toml configuration (CLI flags override)
    let config = GaugeConfig::discover().unwrap_or_default();
    let settings = RunSettings::resolve(&cli, &config)?;
    session.retain(|name| settings.filter.is_match(name));

    match cli.command {
        Some(Commands::List) => {
            list_benchmarks(&session);
            Ok(())
        }
        Some(Commands::Init) => {
            let path = init_config(&std::env::current_dir()?)?;
            println!("Created {}", path.display());
            Ok(())
        }
        Some(Commands::Run) | None => {
            let report = execute(session, &settings, completions)?;
            write_report(&report, &settings)?;
            if report.summary.failed > 0 {
                anyhow::bail!(
                    "{} of {} benchmarks failed",
                    report.summary.failed,
                    report.summary.total_benchmarks
                );
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "gauge=debug" } else { "gauge=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a subscriber may already be installed by the host binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn list_benchmarks(session: &Session) {
    println!("Gauge Plan:");
    for name in session.names() {
        println!("├── {}", name);
    }
    println!("{} benchmarks found.", session.len());
}

/// Write the default configuration to `dir/gauge.toml`, refusing to overwrite
pub fn init_config(dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join("gauge.toml");
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(&path, GaugeConfig::default_toml())?;
    Ok(path)
}

/// Run `session` to completion on a current-thread tokio runtime and build the report
pub fn execute(
    mut session: Session,
    settings: &RunSettings,
    completions: UnboundedReceiver<Completion>,
) -> anyhow::Result<Report> {
    let pb = if settings.progress {
        let pb = ProgressBar::new(session.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };
    let bar = pb.clone();
    session.on_progress(move |bench| {
        bar.set_message(bench.name().to_string());
        bar.inc(1);
    });

    let options = settings.options;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (benchmarks, duration, timeout) = runtime.block_on(async move {
        let runner = session.run(options, |_| {});
        // clamped values, as the run actually used them
        let (duration, timeout) = (runner.target_duration(), runner.timeout());
        (drive(runner, completions).await, duration, timeout)
    });
    pb.finish_and_clear();

    let meta = ReportMeta::now(nanos(duration), nanos(timeout));
    Ok(Report::new(meta, &benchmarks))
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn write_report(report: &Report, settings: &RunSettings) -> anyhow::Result<()> {
    let rendered = render(report, settings.format)?;
    match &settings.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
