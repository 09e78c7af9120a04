//! Episode metric logging.
//!
//! Provides:
//! - `MetricLogger` trait for composable backends
//! - `ConsoleLogger` for lightweight logging through `tracing`
//! - `JsonlLogger` for one JSON record per episode in a file
//! - `CompositeLogger` for fanning out to several backends

mod console;
mod jsonl;
mod logger;

pub use console::ConsoleLogger;
pub use jsonl::JsonlLogger;
pub use logger::{CompositeLogger, MetricLogger, NoOpLogger};
