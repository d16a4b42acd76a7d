//! Console Output
//!
//! One line per benchmark:
//!
//! ```text
//! PASS  parse_small                    10000           812 ns/op
//! FAIL  a_rather_long_benchm ...           1             0 ns/op
//!       error: index out of bounds
//! ```

use crate::report::BenchmarkRecord;

const NAME_WIDTH: usize = 24;
const NAME_KEEP: usize = 20;
const N_WIDTH: usize = 10;
const COST_WIDTH: usize = 18;

/// Render one benchmark as a console line (plus an error line for failures)
pub fn format_line(record: &BenchmarkRecord) -> String {
    let status = if record.passed() { "PASS" } else { "FAIL" };

    let name = if record.name.chars().count() > NAME_WIDTH {
        let kept: String = record.name.chars().take(NAME_KEEP).collect();
        format!("{kept} ...")
    } else {
        format!("{:<width$}", record.name, width = NAME_WIDTH)
    };

    let cost = format!("{} ns/op", record.ns_per_op);
    let mut line = format!(
        "{status}  {name}  {:>n_width$}  {cost:>cost_width$}",
        record.n,
        n_width = N_WIDTH,
        cost_width = COST_WIDTH,
    );

    if let Some(mbps) = record.megabytes_per_sec() {
        line.push_str(&format!("  {mbps:.2} MB/s"));
    }

    if let Some(failure) = &record.failure {
        line.push_str(&format!("\n      error: {failure}"));
    }

    line
}

/// Render every benchmark, one per line, in run order
pub fn format_human_output(records: &[BenchmarkRecord]) -> String {
    let mut output = String::new();
    for record in records {
        output.push_str(&format_line(record));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::record;
    use gauge_core::State;

    #[test]
    fn test_pass_line_layout() {
        let line = format_line(&record("noop", State::Done, 10_000, 8_120_000));
        assert_eq!(
            line,
            "PASS  noop                           10000           812 ns/op"
        );
    }

    #[test]
    fn test_long_name_is_truncated() {
        let line = format_line(&record(
            "a_rather_long_benchmark_name",
            State::Done,
            1,
            5,
        ));
        assert!(line.starts_with("PASS  a_rather_long_benchm ...  "));
    }

    #[test]
    fn test_name_of_exactly_24_chars_is_kept() {
        let name = "x".repeat(24);
        let line = format_line(&record(&name, State::Done, 1, 5));
        assert!(line.contains(&format!("  {name}  ")));
    }

    #[test]
    fn test_fail_line_carries_error() {
        let mut rec = record("boom", State::Failed, 1, 0);
        rec.failure = Some("index out of bounds".to_string());

        let out = format_line(&rec);
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("FAIL  boom"));
        assert_eq!(lines.next(), Some("      error: index out of bounds"));
    }

    #[test]
    fn test_zero_iterations_reports_zero_cost() {
        let line = format_line(&record("never", State::Failed, 0, 0));
        assert!(line.ends_with("0 ns/op"));
    }

    #[test]
    fn test_throughput_column() {
        let mut rec = record("copy", State::Done, 1000, 1_000_000);
        rec.bytes_per_op = 1000;
        assert!(format_line(&rec).ends_with("ns/op  1000.00 MB/s"));
    }

    #[test]
    fn test_output_keeps_order() {
        let out = format_human_output(&[
            record("first", State::Done, 1, 1),
            record("second", State::Failed, 1, 1),
        ]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("PASS  first"));
        assert!(lines[1].starts_with("FAIL  second"));
    }
}
