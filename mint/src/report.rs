//! End-of-run report.
//!
//! Prints the simulation summary followed by the allocator and simulator
//! metrics in Prometheus text format.

use crate::simulate::SimulationReport;
use std::fmt::Write;

/// Render the run summary.
pub fn render_summary(report: &SimulationReport) -> String {
    let mut output = String::with_capacity(256);

    writeln!(output, "Summary:").unwrap();
    writeln!(output, "  Batches:   {}", report.batches.len()).unwrap();
    writeln!(output, "  Tokens:    {}", report.tokens()).unwrap();
    writeln!(output, "  Available: {}", report.stats.available).unwrap();
    if let Some(offset) = report.reserved_offset {
        writeln!(output, "  Reserve:   offset {}", offset).unwrap();
    }

    let status = if report.sold_out {
        "sold out"
    } else if report.interrupted {
        "interrupted"
    } else {
        "open"
    };
    writeln!(output, "  Status:    {}", status).unwrap();

    if report.duplicates > 0 {
        writeln!(output, "  Duplicates: {}", report.duplicates).unwrap();
    }

    output
}

/// Metric name prefixes owned by the allocator and the simulator.
const PREFIXES: &[&str] = &["shuffle_", "mint_"];

/// Render the pool metrics in Prometheus text format, sorted by name.
pub fn render_metrics() -> String {
    let registry = metriken::metrics();
    let mut metrics: Vec<_> = registry
        .iter()
        .filter(|metric| PREFIXES.iter().any(|p| metric.name().starts_with(p)))
        .collect();
    metrics.sort_by(|a, b| a.name().cmp(b.name()));

    let mut output = String::with_capacity(1024);

    for metric in metrics {
        let name = metric.name();

        let value = match metric.value() {
            Some(v) => v,
            None => continue,
        };

        let (kind, value) = match value {
            metriken::Value::Counter(v) => ("counter", v.to_string()),
            metriken::Value::Gauge(v) => ("gauge", v.to_string()),
            // pools only register counters and gauges
            _ => continue,
        };

        writeln!(output, "# TYPE {} {}", name, kind).unwrap();
        writeln!(output, "{} {}", name, value).unwrap();
    }

    output
}
