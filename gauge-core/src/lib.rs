#![warn(missing_docs)]
//! Gauge Core - Trial Runtime
//!
//! This crate provides the measurement engine behind gauge:
//! - `Clock` monotonic nanosecond time with skew compensation and a coarse fallback
//! - `scale` nice-number rounding and the iteration growth policy
//! - `Benchmark` state machine (`Pending -> Running -> Done | Failed`)
//! - `Session`/`Runner` trial loop with asynchronous completion tokens
//! - `drive` tokio adapter that feeds tokens back and enforces the timeout

mod benchmark;
mod clock;
mod driver;
mod runner;
pub mod scale;

pub use benchmark::{AsyncWork, Benchmark, Completion, State, SyncWork, Trial, Work};
pub use clock::{Clock, Coarse, HighResolution, TimeSource, Timer};
pub use driver::drive;
pub use runner::{
    CompletionError, DEFAULT_DURATION, DEFAULT_TIMEOUT, MIN_DURATION, MIN_TIMEOUT, RegisterError,
    RunOptions, RunStatus, Runner, Session,
};
pub use scale::ITERATION_CAP;
