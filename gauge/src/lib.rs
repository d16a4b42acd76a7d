#![warn(missing_docs)]
//! # Gauge
//!
//! Micro-benchmark harness that finds, on its own, how many iterations a unit
//! of work needs before its timing can be trusted.
//!
//! - **Adaptive scaling**: trials grow 1, 100, ... toward a target duration, rounded to nice counts
//! - **Monotonic timing**: skew-compensated nanosecond clock with a coarse fallback
//! - **Asynchronous work**: completion tokens let work finish outside the call that started it
//! - **Failure isolation**: a panicking benchmark is marked failed and the run moves on
//! - **Reports**: `PASS|FAIL` console lines or JSON
//!
//! ## Quick Start
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
//!
//! ## Asynchronous Benchmarks
//!
//! ```ignore
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! session.register("spawn", Work::asynchronous(move |_, done| {
//!     let tx = tx.clone();
//!     tokio::spawn(async move { let _ = tx.send(done); });
//! }))?;
//! gauge::run_with_completions(session, rx)
//! ```

// Re-export core types
pub use gauge_core::{
    Benchmark, Clock, Completion, CompletionError, ITERATION_CAP, RegisterError, RunOptions,
    RunStatus, Runner, Session, State, TimeSource, Trial, Work, drive, scale,
};

// Re-export reporting
pub use gauge_report::{
    BenchmarkRecord, OutputFormat, Report, ReportMeta, ReportSummary, format_human_output,
    format_line, generate_json_report,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{RunOptions, Session, State, Trial, Work};
}

/// Run the gauge CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     gauge::run(session)
/// }
/// ```
pub use gauge_cli::{run, run_with_completions};
