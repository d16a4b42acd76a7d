//! Benchmark - One Registered Unit of Work
//!
//! Holds a benchmark's identity, its work function, lifecycle state and the
//! measurements of the current (or last) trial.

use crate::clock::Timer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a benchmark.
///
/// `Pending -> Running -> {Done, Failed}`; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Registered, not yet dispatched
    Pending,
    /// Trials in progress
    Running,
    /// Measurement trusted
    Done,
    /// Work panicked or the trial was aborted
    Failed,
}

impl State {
    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Done | State::Failed)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Pending => "pending",
            State::Running => "running",
            State::Done => "done",
            State::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Synchronous work: runs `trial.iterations()` units before returning.
pub type SyncWork = Box<dyn FnMut(&mut Trial<'_>)>;

/// Asynchronous work: schedules one unit and hands back `Completion` when it finishes.
pub type AsyncWork = Box<dyn FnMut(&mut Trial<'_>, Completion)>;

/// The callable unit, tagged by how it signals completion
pub enum Work {
    /// Finished when the function returns
    Sync(SyncWork),
    /// Finished when every issued [`Completion`] has been signalled
    Async(AsyncWork),
}

impl Work {
    /// Wrap a synchronous closure
    pub fn sync<F>(f: F) -> Self
    where
        F: FnMut(&mut Trial<'_>) + 'static,
    {
        Work::Sync(Box::new(f))
    }

    /// Wrap an asynchronous closure
    pub fn asynchronous<F>(f: F) -> Self
    where
        F: FnMut(&mut Trial<'_>, Completion) + 'static,
    {
        Work::Async(Box::new(f))
    }

    /// Whether completion is signalled out of band
    pub fn is_async(&self) -> bool {
        matches!(self, Work::Async(_))
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Sync(_) => f.write_str("Work::Sync"),
            Work::Async(_) => f.write_str("Work::Async"),
        }
    }
}

/// Single-use token proving one unit of asynchronous work finished.
///
/// Issued by the runner for each invocation of asynchronous work and
/// consumed by [`Runner::signal_completion`](crate::Runner::signal_completion).
#[must_use = "an unsignalled completion stalls the run"]
#[derive(Debug, PartialEq, Eq)]
pub struct Completion {
    pub(crate) index: usize,
    pub(crate) ticket: u64,
}

impl Completion {
    /// Position of the benchmark this token belongs to
    pub fn benchmark_index(&self) -> usize {
        self.index
    }
}

/// A registered benchmark and its measurements
#[derive(Debug)]
pub struct Benchmark {
    name: String,
    pub(crate) work: Work,
    state: State,
    pub(crate) n: u64,
    pub(crate) elapsed: u64,
    pub(crate) completed: u64,
    pub(crate) bytes_per_op: u64,
    failure: Option<String>,
}

impl Benchmark {
    /// New benchmark in `Pending` state
    pub fn new(name: impl Into<String>, work: Work) -> Self {
        Self {
            name: name.into(),
            work,
            state: State::Pending,
            n: 0,
            elapsed: 0,
            completed: 0,
            bytes_per_op: 0,
            failure: None,
        }
    }

    /// Benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Iterations in the current or last trial
    pub fn iterations(&self) -> u64 {
        self.n
    }

    /// Nanoseconds measured in the current or last trial
    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed
    }

    /// Completion signals received in the current trial
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Throughput hint set by the work
    pub fn bytes_per_op(&self) -> u64 {
        self.bytes_per_op
    }

    /// Whether the work is asynchronous
    pub fn is_async(&self) -> bool {
        self.work.is_async()
    }

    /// Panic message or abort reason for a failed benchmark
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Mean cost of one iteration, truncated. Zero before any trial.
    pub fn ns_per_op(&self) -> u64 {
        if self.n == 0 {
            0
        } else {
            self.elapsed / self.n
        }
    }

    /// Enter `Running`. Ignored unless `Pending`.
    pub(crate) fn begin(&mut self) {
        if self.state == State::Pending {
            self.state = State::Running;
        }
    }

    /// Reset per-trial counters for a trial of `n` iterations
    pub(crate) fn prepare_trial(&mut self, n: u64) {
        debug_assert!(n >= self.n, "iteration count must not shrink");
        self.n = n;
        self.elapsed = 0;
        self.completed = 0;
        self.bytes_per_op = 0;
    }

    /// `Running -> Done`
    pub(crate) fn finish(&mut self) {
        if self.state == State::Running {
            self.state = State::Done;
        }
    }

    /// `Running -> Failed`, keeping the reason
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        if !self.state.is_terminal() {
            self.state = State::Failed;
            self.failure = Some(reason.into());
        }
    }
}

/// View handed to work during a trial
pub struct Trial<'a> {
    timer: &'a mut Timer,
    iterations: u64,
    bytes: &'a mut u64,
}

impl<'a> Trial<'a> {
    pub(crate) fn new(timer: &'a mut Timer, iterations: u64, bytes: &'a mut u64) -> Self {
        Self {
            timer,
            iterations,
            bytes,
        }
    }

    /// Iterations this trial must perform
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Record bytes processed per iteration, for throughput reporting
    pub fn set_bytes(&mut self, bytes: u64) {
        *self.bytes = bytes;
    }

    /// Discard time and the byte hint recorded so far in this trial
    pub fn reset_timer(&mut self) {
        self.timer.reset();
        *self.bytes = 0;
    }

    /// Resume timing after [`Trial::stop_timer`]
    pub fn start_timer(&mut self) {
        self.timer.start();
    }

    /// Pause timing, e.g. around per-trial setup
    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Run `f` once per iteration
    #[inline]
    pub fn iter<T, F>(&mut self, mut f: F)
    where
        F: FnMut() -> T,
    {
        for _ in 0..self.iterations {
            std::hint::black_box(f());
        }
    }
}
