//! Report Data Structures

use chrono::{DateTime, Utc};
use gauge_core::{Benchmark, State};
use serde::{Deserialize, Serialize};

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run parameters and timestamp
    pub meta: ReportMeta,
    /// One record per benchmark, in run order
    pub results: Vec<BenchmarkRecord>,
    /// Pass/fail counts
    pub summary: ReportSummary,
}

impl Report {
    /// Snapshot a finished run
    pub fn new(meta: ReportMeta, benchmarks: &[Benchmark]) -> Self {
        let results: Vec<BenchmarkRecord> = benchmarks.iter().map(BenchmarkRecord::from).collect();
        let summary = ReportSummary::from_records(&results);
        Self {
            meta,
            results,
            summary,
        }
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Gauge version that produced the report
    pub version: String,
    /// When the report was built
    pub timestamp: DateTime<Utc>,
    /// Measurement target per benchmark
    pub duration_ns: u64,
    /// Advisory per-trial timeout
    pub timeout_ns: u64,
}

impl ReportMeta {
    /// Metadata stamped with the current time
    pub fn now(duration_ns: u64, timeout_ns: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            duration_ns,
            timeout_ns,
        }
    }
}

/// One benchmark's final measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Registered name
    pub name: String,
    /// Terminal state
    pub state: State,
    /// Iterations in the final trial
    pub n: u64,
    /// Duration of the final trial
    pub elapsed_ns: u64,
    /// `elapsed_ns / n`, 0 when nothing ran
    pub ns_per_op: u64,
    /// Throughput hint, 0 when unset
    pub bytes_per_op: u64,
    /// Panic message or abort reason
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<String>,
}

impl BenchmarkRecord {
    /// Whether the benchmark finished without failure
    pub fn passed(&self) -> bool {
        self.state == State::Done
    }

    /// Throughput in MB/s (1e6 bytes), when a byte hint was set
    pub fn megabytes_per_sec(&self) -> Option<f64> {
        if self.bytes_per_op == 0 || self.elapsed_ns == 0 {
            return None;
        }
        let bytes = self.bytes_per_op as f64 * self.n as f64;
        Some(bytes * 1e3 / self.elapsed_ns as f64)
    }
}

impl From<&Benchmark> for BenchmarkRecord {
    fn from(bench: &Benchmark) -> Self {
        Self {
            name: bench.name().to_string(),
            state: bench.state(),
            n: bench.iterations(),
            elapsed_ns: bench.elapsed_ns(),
            ns_per_op: bench.ns_per_op(),
            bytes_per_op: bench.bytes_per_op(),
            failure: bench.failure().map(str::to_string),
        }
    }
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Benchmarks in the run
    pub total_benchmarks: usize,
    /// Reached `Done`
    pub passed: usize,
    /// Reached `Failed`
    pub failed: usize,
}

impl ReportSummary {
    /// Count outcomes
    pub fn from_records(records: &[BenchmarkRecord]) -> Self {
        let passed = records.iter().filter(|r| r.passed()).count();
        Self {
            total_benchmarks: records.len(),
            passed,
            failed: records.len() - passed,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(name: &str, state: State, n: u64, elapsed_ns: u64) -> BenchmarkRecord {
        BenchmarkRecord {
            name: name.to_string(),
            state,
            n,
            elapsed_ns,
            ns_per_op: if n == 0 { 0 } else { elapsed_ns / n },
            bytes_per_op: 0,
            failure: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record("a", State::Done, 10, 100),
            record("b", State::Failed, 1, 5),
            record("c", State::Done, 20, 100),
        ];
        let summary = ReportSummary::from_records(&records);
        assert_eq!(summary.total_benchmarks, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_throughput() {
        let mut rec = record("copy", State::Done, 1000, 1_000_000);
        assert_eq!(rec.megabytes_per_sec(), None);

        // 1 KB per op, 1000 ops in 1 ms -> 1000 MB/s
        rec.bytes_per_op = 1000;
        let mbps = rec.megabytes_per_sec().unwrap();
        assert!((mbps - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_from_benchmark() {
        use gauge_core::{RunOptions, Session, Work};

        let mut session = Session::new();
        session
            .register("boom", Work::sync(|_| panic!("kaput")))
            .unwrap();
        let runner = session.run(RunOptions::default(), |_| {});

        let rec = BenchmarkRecord::from(&runner.results()[0]);
        assert_eq!(rec.name, "boom");
        assert_eq!(rec.state, State::Failed);
        assert_eq!(rec.n, 1);
        assert_eq!(rec.failure.as_deref(), Some("kaput"));
    }
}
