//! Report module: prints human-readable benchmark results.

use crate::ssb::QueryTiming;
use anyhow::Result;
use dbbench_core::RunReport;
use serde::Serialize;

/// Elapsed-time summary over a set of timed queries.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySummary {
    samples_us: Vec<f64>,
}

impl QuerySummary {
    pub fn new(timings: &[QueryTiming]) -> Self {
        Self {
            samples_us: timings
                .iter()
                .map(|t| t.elapsed.as_secs_f64() * 1e6)
                .collect(),
        }
    }

    pub fn total_us(&self) -> f64 {
        self.samples_us.iter().sum()
    }

    pub fn mean_us(&self) -> f64 {
        if self.samples_us.is_empty() {
            return 0.0;
        }
        self.total_us() / self.samples_us.len() as f64
    }

    /// Nearest-rank percentile, `pct` in `[0, 100]`.
    pub fn percentile_us(&self, pct: f64) -> f64 {
        if self.samples_us.is_empty() {
            return 0.0;
        }
        let mut sorted = self.samples_us.clone();
        sorted.sort_by(f64::total_cmp);
        let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

/// Per-query elapsed seconds joined by commas, in execution order.
pub fn query_csv_line(timings: &[QueryTiming]) -> String {
    timings
        .iter()
        .map(|t| format!("{:.6}", t.elapsed.as_secs_f64()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print throughput and per-worker outcome counts of a closed-loop run.
pub fn print_run_report(title: &str, report: &RunReport) {
    println!("\n{}", "=".repeat(80));
    println!("  {title}");
    println!("{}", "=".repeat(80));

    println!(
        "  Throughput:      {:>12.1} ops/s",
        report.throughput()
    );
    println!("  Completed:       {:>12}", report.completed());
    println!("  Missing:         {:>12}", report.missing());
    println!("  Conflicts:       {:>12}", report.conflicts());
    println!(
        "  Measured:        {:>12.2}s nominal, {:.2}s actual",
        report.measure.as_secs_f64(),
        report.elapsed.as_secs_f64()
    );

    if report.workers.len() > 1 {
        println!("\n  Per-worker breakdown:");
        println!(
            "  {:8} {:>12} {:>12} {:>10} {:>10}",
            "Worker", "Completed", "Success", "Missing", "Conflict"
        );
        println!("  {}", "-".repeat(56));
        for (idx, tally) in report.workers.iter().enumerate() {
            println!(
                "  {:8} {:>12} {:>12} {:>10} {:>10}",
                idx,
                tally.completed,
                tally.successes(),
                tally.missing,
                tally.conflicts
            );
        }
    }

    println!();
}

/// Print per-query times followed by a summary line.
pub fn print_query_report(timings: &[QueryTiming]) {
    println!("\n{}", "=".repeat(80));
    println!("  SSB Query Report");
    println!("{}", "=".repeat(80));
    println!("  {:8} {:>14} {:>12} {:>10}", "Query", "Elapsed (ms)", "Elapsed (s)", "Rows");
    println!("  {}", "-".repeat(48));
    for t in timings {
        let secs = t.elapsed.as_secs_f64();
        println!(
            "  {:8} {:>14.2} {:>12.4} {:>10}",
            t.name,
            secs * 1000.0,
            secs,
            t.rows
        );
    }

    let summary = QuerySummary::new(timings);
    println!("  {}", "-".repeat(48));
    println!("  Total:           {:>10.2}ms", summary.total_us() / 1000.0);
    println!("  Mean:            {:>10.2}ms", summary.mean_us() / 1000.0);
    println!("  p50:             {:>10.2}ms", summary.percentile_us(50.0) / 1000.0);
    println!("  p95:             {:>10.2}ms", summary.percentile_us(95.0) / 1000.0);
    println!("\n  CSV: {}", query_csv_line(timings));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn timing(name: &str, ms: u64) -> QueryTiming {
        QueryTiming {
            name: name.to_string(),
            elapsed: Duration::from_millis(ms),
            rows: 1,
        }
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let summary = QuerySummary::new(&[]);
        assert_eq!(summary.mean_us(), 0.0);
        assert_eq!(summary.percentile_us(95.0), 0.0);
    }

    #[test]
    fn summary_percentiles() {
        let timings: Vec<_> = (1..=5).map(|i| timing("q", i * 10)).collect();
        let summary = QuerySummary::new(&timings);
        assert!((summary.mean_us() - 30_000.0).abs() < 1e-6);
        assert!((summary.percentile_us(50.0) - 30_000.0).abs() < 1e-6);
        assert!((summary.percentile_us(100.0) - 50_000.0).abs() < 1e-6);
        assert!((summary.percentile_us(0.0) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn csv_line_keeps_order() {
        let line = query_csv_line(&[timing("q1.1", 1500), timing("q1.2", 250)]);
        assert_eq!(line, "1.500000,0.250000");
    }
}
