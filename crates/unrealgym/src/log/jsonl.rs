//! JSON-lines logging backend.

use super::MetricLogger;
use crate::Result;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Logger that appends one JSON object per report to a file:
/// `{"episode": 3, "episode_collisions": 2.0, ...}`.
pub struct JsonlLogger {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlLogger {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_record(&self, record: Map<String, Value>) {
        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = write_line(&mut writer, &record) {
                tracing::warn!(error = %e, "failed to write metrics record");
            }
        }
    }
}

fn write_line(writer: &mut BufWriter<File>, record: &Map<String, Value>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writeln!(writer)?;
    writer.flush()
}

fn record(step: u64) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("episode".to_string(), Value::from(step));
    record
}

impl MetricLogger for JsonlLogger {
    fn log_scalar(&self, name: &str, value: f64, step: u64) {
        let mut record = record(step);
        record.insert(name.to_string(), Value::from(value));
        self.write_record(record);
    }

    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        let mut record = record(step);
        for (name, value) in metrics {
            record.insert(name.clone(), Value::from(*value));
        }
        self.write_record(record);
    }

    fn close(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let logger = JsonlLogger::create(&path).unwrap();

        let metrics = HashMap::from([
            ("episode_length".to_string(), 20.0),
            ("episode_collisions".to_string(), 3.0),
        ]);
        logger.log_metrics(&metrics, 1);
        logger.log_scalar("episode_length", 7.0, 2);
        logger.close();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["episode"], 1);
        assert_eq!(lines[0]["episode_collisions"], 3.0);
        assert_eq!(lines[1]["episode"], 2);
        assert_eq!(lines[1]["episode_length"], 7.0);
    }
}
