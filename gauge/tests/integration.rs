//! Integration tests for Gauge
//!
//! These tests verify the end-to-end behavior of the benchmarking system.

use gauge::prelude::*;
use gauge::{
    BenchmarkRecord, Clock, Completion, ITERATION_CAP, RunStatus, TimeSource, format_line, scale,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Clock that only moves when work says so
#[derive(Clone, Default)]
struct Simulated(Rc<Cell<u64>>);

impl TimeSource for Simulated {
    fn read(&mut self) -> u64 {
        self.0.get()
    }

    fn is_high_resolution(&self) -> bool {
        true
    }
}

/// Test the noop scenario: one result, done, measured for at least the target
#[test]
fn test_noop_reaches_target() {
    let mut session = Session::new();
    session
        .register(
            "noop",
            Work::sync(|t| {
                t.iter(|| ());
            }),
        )
        .unwrap();

    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = results.clone();
    let options = RunOptions::default().with_duration(Duration::from_millis(10));
    let runner = session.run(options, move |benches| {
        sink.borrow_mut()
            .extend(benches.iter().map(BenchmarkRecord::from));
    });

    assert!(runner.is_finished());
    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].state, State::Done);
    assert!(results[0].n >= 1);
    // the cap ends the run even if a trial measured nothing
    assert!(results[0].elapsed_ns >= 10_000_000 || results[0].n == ITERATION_CAP);
}

/// Test the boom scenario: exactly one failed result after one trial
#[test]
fn test_boom_fails_on_first_trial() {
    let mut session = Session::new();
    session
        .register("boom", Work::sync(|_| panic!("boom")))
        .unwrap();

    let runner = session.run(RunOptions::default(), |_| {});
    let results = runner.into_results();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].state(), State::Failed);
    assert_eq!(results[0].iterations(), 1);
    assert_eq!(results[0].failure(), Some("boom"));
}

/// Test that fixed-cost work converges so that n * cost covers the target
#[test]
fn test_fixed_cost_converges() {
    for cost in [1u64, 7, 250, 12_345, 3_000_000] {
        let clock = Simulated::default();
        let tick = clock.clone();
        let mut session = Session::new();
        session.with_clock(Clock::with_source(clock));
        session
            .register(
                "fixed",
                Work::sync(move |t| tick.0.set(tick.0.get() + cost * t.iterations())),
            )
            .unwrap();

        let target = 20_000_000;
        let runner = session.run(
            RunOptions::default().with_duration(Duration::from_nanos(target)),
            |_| {},
        );
        let bench = &runner.results()[0];

        assert_eq!(bench.state(), State::Done, "cost {cost}");
        assert!(
            bench.iterations() * cost >= target || bench.iterations() == ITERATION_CAP,
            "cost {cost}: n={}",
            bench.iterations()
        );
        assert_eq!(bench.ns_per_op(), cost);
        let n = bench.iterations();
        assert_eq!(scale::round_up(n), n, "iteration counts stay nice");
    }
}

/// Test that a failure does not stop later benchmarks
#[test]
fn test_failure_is_isolated() {
    let mut session = Session::new();
    session
        .register("first", Work::sync(|t| t.iter(|| 1u8)))
        .unwrap()
        .register("broken", Work::sync(|_| panic!("{}", "formatted message")))
        .unwrap()
        .register("last", Work::sync(|t| t.iter(|| 2u8)))
        .unwrap();

    let options = RunOptions::default().with_duration(Duration::from_millis(2));
    let runner = session.run(options, |_| {});
    let states: Vec<State> = runner.results().iter().map(|b| b.state()).collect();

    assert_eq!(states, vec![State::Done, State::Failed, State::Done]);
    assert_eq!(runner.results()[1].failure(), Some("formatted message"));
}

/// Test the asynchronous contract with a hand-rolled event loop
#[test]
fn test_async_event_loop() {
    let clock = Simulated::default();
    let queue: Rc<RefCell<VecDeque<Completion>>> = Rc::default();

    let mut session = Session::new();
    session.with_clock(Clock::with_source(clock.clone()));
    let (tick, q) = (clock.clone(), queue.clone());
    session
        .register(
            "deferred",
            Work::asynchronous(move |_, done| {
                tick.0.set(tick.0.get() + 2_000);
                q.borrow_mut().push_back(done);
            }),
        )
        .unwrap();

    let mut runner = session.run(
        RunOptions::default().with_duration(Duration::from_millis(1)),
        |_| {},
    );
    assert!(matches!(runner.status(), RunStatus::Suspended { .. }));

    let mut signals = 0;
    loop {
        let Some(token) = queue.borrow_mut().pop_front() else {
            break;
        };
        signals += 1;
        runner.signal_completion(token).unwrap();
    }

    assert!(runner.is_finished());
    let bench = &runner.results()[0];
    assert_eq!(bench.state(), State::Done);
    assert_eq!(bench.completed(), bench.iterations());
    assert!(bench.elapsed_ns() >= 1_000_000);
    // 1 + 100 + 1000
    assert_eq!(signals, 1101);
}

/// Test the full async path through the tokio driver
#[tokio::test]
async fn test_tokio_driver() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session = Session::new();
    session
        .register(
            "yield",
            Work::asynchronous(move |_, done| {
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    let _ = tx.send(done);
                });
            }),
        )
        .unwrap();

    let options = RunOptions::default().with_duration(Duration::from_millis(5));
    let runner = session.run(options, |_| {});
    let results = gauge::drive(runner, rx).await;

    assert_eq!(results[0].state(), State::Done);
    assert!(results[0].elapsed_ns() >= 5_000_000);
}

/// Test the console line of a finished run
#[test]
fn test_report_line() {
    let mut session = Session::new();
    session
        .register("boom", Work::sync(|_| panic!("bad input")))
        .unwrap();
    let runner = session.run(RunOptions::default(), |_| {});

    let line = format_line(&BenchmarkRecord::from(&runner.results()[0]));
    assert!(line.starts_with("FAIL  boom                               1"));
    assert!(line.ends_with("error: bad input"));
}
