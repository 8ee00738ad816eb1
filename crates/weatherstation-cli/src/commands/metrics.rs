//! `weatherstation metrics` — list the derived metrics.

use weatherstation_core::DerivedMetric;

pub fn run() {
    println!(
        "{:<12} {:<14} {:<14} {:>5} {:>7} {:>5}",
        "Metric", "Primary", "Secondary", "Mode", "Window", "Unit"
    );
    println!("{}", "-".repeat(62));
    for metric in DerivedMetric::ALL {
        let (primary, secondary) = metric.inputs();
        println!(
            "{:<12} {:<14} {:<14} {:>5} {:>6}s {:>5}",
            metric.source_name(),
            primary.to_string(),
            secondary.to_string(),
            metric.align_mode().to_string(),
            metric.default_interval().as_secs(),
            metric.kind().unit()
        );
    }
}
