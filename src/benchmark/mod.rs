//! Benchmark orchestration: per-recording driver and result aggregation.

pub mod driver;
pub mod types;

pub use driver::{run_benchmark, run_recording, write_report, MappingMode, RecordingInput};
pub use types::{AggregateReport, RecordingResult};
