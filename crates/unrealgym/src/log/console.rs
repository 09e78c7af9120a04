//! Console logging backend.

use super::MetricLogger;
use std::collections::HashMap;

/// Logger that reports metrics through `tracing` at info level.
pub struct ConsoleLogger;

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self
    }
}

/// `name=value` pairs sorted by name, one line.
fn format_metrics(metrics: &HashMap<String, f64>) -> String {
    let mut sorted: Vec<_> = metrics.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value:.4}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl MetricLogger for ConsoleLogger {
    fn log_scalar(&self, name: &str, value: f64, step: u64) {
        tracing::info!("Episode {}: {} = {:.4}", step, name, value);
    }

    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        tracing::info!("Episode {}: {}", step, format_metrics(metrics));
    }
}
