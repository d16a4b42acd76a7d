//! Session and Runner
//!
//! A [`Session`] collects registrations. [`Session::run`] consumes it and
//! returns a [`Runner`] that drives every benchmark through its trials in
//! registration order.
//!
//! ## Trial loop
//!
//! ```text
//! Pending ──dispatch(1)──▶ Running ──trial closes──▶ elapsed < target && n < cap ?
//!                             ▲                          │ yes          │ no
//!                             └──dispatch(next_n)────────┘              ▼
//!                                                                  Done / Failed
//! ```
//!
//! A synchronous trial closes when the work returns. An asynchronous trial
//! closes when `n` completion tokens have come back through
//! [`Runner::signal_completion`]; until then `run` and `signal_completion`
//! return with the runner suspended. Nothing inside the runner enforces the
//! timeout: a caller that never returns the tokens stalls the run, and is
//! expected to use [`Runner::timeout`] and [`Runner::abort_trial`].

use crate::benchmark::{Benchmark, Completion, State, Trial, Work};
use crate::clock::{Clock, Timer};
use crate::scale::{self, ITERATION_CAP};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default per-benchmark measurement target
pub const DEFAULT_DURATION: Duration = Duration::from_millis(500);

/// Default advisory per-trial timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Smallest accepted measurement target
pub const MIN_DURATION: Duration = Duration::from_millis(1);

/// Smallest accepted timeout
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Options for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// How long a trial must run before its measurement is trusted
    pub duration: Duration,
    /// Advisory bound on a single trial's wall time
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RunOptions {
    /// Set the measurement target
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the advisory timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Raise degenerate values to their minimums
    pub fn sanitized(self) -> Self {
        let mut options = self;
        if options.duration < MIN_DURATION {
            warn!(duration = ?options.duration, min = ?MIN_DURATION, "duration too small, clamping");
            options.duration = MIN_DURATION;
        }
        if options.timeout < MIN_TIMEOUT {
            warn!(timeout = ?options.timeout, min = ?MIN_TIMEOUT, "timeout too small, clamping");
            options.timeout = MIN_TIMEOUT;
        }
        options
    }
}

/// Registration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Benchmark names must be non-empty
    #[error("benchmark name is empty")]
    EmptyName,
    /// Benchmark names must be unique within a session
    #[error("benchmark '{0}' is already registered")]
    Duplicate(String),
}

/// Errors from [`Runner::signal_completion`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// No asynchronous invocation is outstanding
    #[error("no trial is waiting for completion")]
    NotSuspended,
    /// The token was not issued for the outstanding invocation
    #[error("completion token for benchmark #{index} does not match the outstanding invocation")]
    Stale {
        /// Benchmark index carried by the token
        index: usize,
    },
}

/// Where a run stands after control returns to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Waiting for completion tokens of an asynchronous trial
    Suspended {
        /// Benchmark being measured
        name: String,
        /// Iterations in the outstanding trial
        iterations: u64,
        /// Tokens returned so far
        completed: u64,
    },
    /// Every benchmark reached a terminal state
    Finished,
}

type ProgressFn = Box<dyn FnMut(&Benchmark)>;
type FinishFn = Box<dyn FnOnce(&[Benchmark])>;

/// Registration surface, consumed once by [`Session::run`]
#[derive(Default)]
pub struct Session {
    queue: Vec<Benchmark>,
    progress: Option<ProgressFn>,
    clock: Option<Clock>,
}

impl Session {
    /// Empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a benchmark; execution order is registration order
    pub fn register(
        &mut self,
        name: impl Into<String>,
        work: Work,
    ) -> Result<&mut Self, RegisterError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if self.queue.iter().any(|b| b.name() == name) {
            return Err(RegisterError::Duplicate(name));
        }
        self.queue.push(Benchmark::new(name, work));
        Ok(self)
    }

    /// Observe each benchmark as it reaches a terminal state
    pub fn on_progress<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&Benchmark) + 'static,
    {
        self.progress = Some(Box::new(f));
        self
    }

    /// Use a specific clock instead of the high-resolution default
    pub fn with_clock(&mut self, clock: Clock) -> &mut Self {
        self.clock = Some(clock);
        self
    }

    /// Keep only benchmarks whose name satisfies `keep`
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.queue.retain(|b| keep(b.name()));
    }

    /// Registered names in execution order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(Benchmark::name)
    }

    /// Number of registered benchmarks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Start driving the queue.
    ///
    /// Synchronous benchmarks run to completion before this returns. If an
    /// asynchronous benchmark is reached, the returned runner is suspended
    /// until its completion tokens come back. `callback` fires exactly once,
    /// when the last benchmark reaches a terminal state.
    pub fn run<F>(self, options: RunOptions, callback: F) -> Runner
    where
        F: FnOnce(&[Benchmark]) + 'static,
    {
        let options = options.sanitized();
        let clock = self.clock.unwrap_or_default();
        debug!(
            benchmarks = self.queue.len(),
            high_resolution = clock.is_high_resolution(),
            "starting run"
        );

        let mut runner = Runner {
            queue: self.queue,
            index: 0,
            target_ns: u64::try_from(options.duration.as_nanos()).unwrap_or(u64::MAX),
            timeout: options.timeout,
            timer: Timer::new(clock),
            next_ticket: 0,
            trials: 0,
            outstanding: None,
            progress: self.progress,
            callback: Some(Box::new(callback)),
            finished: false,
        };
        runner.drive();
        runner
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("queue", &self.queue)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Drives a session's benchmarks through their trials
pub struct Runner {
    queue: Vec<Benchmark>,
    index: usize,
    target_ns: u64,
    timeout: Duration,
    timer: Timer,
    next_ticket: u64,
    trials: u64,
    outstanding: Option<u64>,
    progress: Option<ProgressFn>,
    callback: Option<FinishFn>,
    finished: bool,
}

impl Runner {
    /// Current position in the run
    pub fn status(&self) -> RunStatus {
        match self.current() {
            Some(bench) if !self.finished => RunStatus::Suspended {
                name: bench.name().to_string(),
                iterations: bench.iterations(),
                completed: bench.completed(),
            },
            _ => RunStatus::Finished,
        }
    }

    /// Whether every benchmark is terminal
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Benchmark currently being driven
    pub fn current(&self) -> Option<&Benchmark> {
        self.queue.get(self.index)
    }

    /// Measurement target per trial
    pub fn target_duration(&self) -> Duration {
        Duration::from_nanos(self.target_ns)
    }

    /// Advisory per-trial timeout for the collaborator's cancellation policy
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Trials dispatched so far. Changes exactly when a new trial starts,
    /// so a caller can tell a fresh trial from further units of the same one.
    pub fn trials_started(&self) -> u64 {
        self.trials
    }

    /// All benchmarks, in registration order
    pub fn results(&self) -> &[Benchmark] {
        &self.queue
    }

    /// Take the benchmarks out of the runner
    pub fn into_results(self) -> Vec<Benchmark> {
        self.queue
    }

    /// Hand back one completion token of the outstanding asynchronous trial.
    ///
    /// Once the trial has `n` completions the timer stops and the usual
    /// scaling decision is made; otherwise the work is invoked again with a
    /// fresh token.
    pub fn signal_completion(&mut self, token: Completion) -> Result<RunStatus, CompletionError> {
        let ticket = match self.outstanding {
            Some(ticket) if !self.finished => ticket,
            _ => return Err(CompletionError::NotSuspended),
        };
        if token.index != self.index || token.ticket != ticket {
            return Err(CompletionError::Stale { index: token.index });
        }
        self.outstanding = None;

        let bench = &mut self.queue[self.index];
        bench.completed += 1;
        if bench.completed < bench.n {
            if self.invoke_async() {
                return Ok(self.status());
            }
        } else {
            self.timer.stop();
            bench.elapsed = self.timer.elapsed();
        }

        self.drive();
        Ok(self.status())
    }

    /// Fail the outstanding asynchronous trial and move on.
    ///
    /// No-op unless the runner is suspended.
    pub fn abort_trial(&mut self, reason: impl Into<String>) -> RunStatus {
        if self.outstanding.take().is_none() || self.finished {
            return self.status();
        }
        let reason = reason.into();
        self.timer.stop();
        let bench = &mut self.queue[self.index];
        bench.elapsed = self.timer.elapsed();
        warn!(benchmark = bench.name(), %reason, "aborting trial");
        bench.fail(reason);

        self.drive();
        self.status()
    }

    /// Advance through the queue until finished or suspended
    fn drive(&mut self) {
        while let Some(bench) = self.queue.get_mut(self.index) {
            match bench.state() {
                State::Pending => {
                    bench.begin();
                    if self.dispatch(1) {
                        return;
                    }
                }
                State::Running => {
                    if bench.elapsed < self.target_ns && bench.n < ITERATION_CAP {
                        let next = scale::next_iterations(
                            bench.n,
                            bench.elapsed,
                            self.target_ns,
                            self.timer.is_high_resolution(),
                        );
                        if self.dispatch(next) {
                            return;
                        }
                    } else {
                        bench.finish();
                    }
                }
                State::Done | State::Failed => self.advance(),
            }
        }
        self.complete();
    }

    /// Start a trial of `n` iterations. Returns true if suspended.
    fn dispatch(&mut self, n: u64) -> bool {
        let bench = &mut self.queue[self.index];
        bench.prepare_trial(n);
        self.trials += 1;
        debug!(benchmark = bench.name(), iterations = n, "trial");

        self.timer.reset();
        self.timer.start();

        let Work::Sync(work) = &mut bench.work else {
            return self.invoke_async();
        };
        let timer = &mut self.timer;
        let bytes = &mut bench.bytes_per_op;
        let outcome = catch_unwind(AssertUnwindSafe(|| work(&mut Trial::new(timer, n, bytes))));
        self.timer.stop();
        bench.elapsed = self.timer.elapsed();
        if let Err(panic) = outcome {
            bench.fail(panic_message(panic));
        }
        false
    }

    /// Issue a token and invoke asynchronous work once. Returns true if suspended.
    fn invoke_async(&mut self) -> bool {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let bench = &mut self.queue[self.index];
        let n = bench.n;
        let Work::Async(work) = &mut bench.work else {
            return false;
        };
        let token = Completion {
            index: self.index,
            ticket,
        };
        let timer = &mut self.timer;
        let bytes = &mut bench.bytes_per_op;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            work(&mut Trial::new(timer, n, bytes), token)
        }));

        match outcome {
            Ok(()) => {
                self.outstanding = Some(ticket);
                true
            }
            Err(panic) => {
                self.timer.stop();
                bench.elapsed = self.timer.elapsed();
                bench.fail(panic_message(panic));
                false
            }
        }
    }

    fn advance(&mut self) {
        let bench = &self.queue[self.index];
        info!(
            benchmark = bench.name(),
            state = %bench.state(),
            iterations = bench.iterations(),
            ns_per_op = bench.ns_per_op(),
            "benchmark finished"
        );
        if let Some(progress) = self.progress.as_mut() {
            progress(bench);
        }
        self.index += 1;
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(callback) = self.callback.take() {
            callback(&self.queue);
        }
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("index", &self.index)
            .field("target_ns", &self.target_ns)
            .field("timeout", &self.timeout)
            .field("outstanding", &self.outstanding)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
