//! Tokio Driver
//!
//! Feeds completion tokens from an mpsc channel back into a suspended
//! [`Runner`], aborting any trial whose wall time exceeds the runner's
//! advisory timeout.
//!
//! ```ignore
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! session.register("spawn", Work::asynchronous(move |_, done| {
//!     let tx = tx.clone();
//!     tokio::spawn(async move { let _ = tx.send(done); });
//! }))?;
//! let runner = session.run(RunOptions::default(), |_| {});
//! let results = gauge_core::drive(runner, rx).await;
//! ```

use crate::benchmark::{Benchmark, Completion};
use crate::runner::Runner;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

/// Stand-in deadline for timeouts too large to add to an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Drive `runner` to completion and return its benchmarks.
///
/// Each trial gets one deadline, [`Runner::timeout`] after it is first seen
/// suspended; completions arriving within the trial do not extend it. A trial
/// still open at its deadline is aborted, as is one left waiting when the
/// channel closes. Work that spawns tasks must have been started (via
/// `Session::run`) inside the runtime.
pub async fn drive(
    mut runner: Runner,
    mut completions: UnboundedReceiver<Completion>,
) -> Vec<Benchmark> {
    let mut trial = None;
    let mut deadline = Instant::now();

    while !runner.is_finished() {
        let limit = runner.timeout();
        if trial != Some(runner.trials_started()) {
            trial = Some(runner.trials_started());
            let now = Instant::now();
            deadline = now.checked_add(limit).unwrap_or(now + FAR_FUTURE);
        }

        match timeout_at(deadline, completions.recv()).await {
            Ok(Some(token)) => {
                if let Err(err) = runner.signal_completion(token) {
                    warn!(%err, "ignoring completion");
                }
            }
            Ok(None) => {
                runner.abort_trial("completion channel closed");
            }
            Err(_) => {
                runner.abort_trial(format!("timed out after {limit:?}"));
            }
        }
    }
    runner.into_results()
}
