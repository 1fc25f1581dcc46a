//! Analysis components and the report types they produce.
//!
//! Every component is constructed with its own [`Diagnostics`](crate::Diagnostics)
//! and works on data that has already been fetched: it performs no network
//! I/O and keeps no state between calls.
//!
//! ## Submodules
//!
//! - [`duration`]: Duration and timestamp formatting, duration statistics
//! - [`event_log`]: Single-pass aggregation of Spark event logs
//! - [`metrics`]: Per-stage byte counters and the accumulator lookup table
//! - [`history`]: Run-history statistics and notable-run rankings
//! - [`run`]: One run's summary with derived alerts
//! - [`job`]: Job definition summaries
//! - [`thresholds`]: Alert and ranking limits
//!
//! ## Data Flow
//!
//! ```text
//! event-log lines ──▶ EventLogAggregator ──▶ ParsedEventLog ──▶ EventLogSummary
//!
//! [RunRecord]     ──▶ RunHistoryAnalyzer ──▶ RunHistoryReport
//!
//! RawRun (+ RawRunOutput) ──▶ RunDetailProcessor ──▶ RunSummary
//! ```

pub mod duration;
pub mod event_log;
pub mod history;
pub mod job;
pub mod metrics;
pub mod run;
pub mod thresholds;

pub use duration::{
    format_duration, format_duration_ms, format_timestamp, parse_duration, DurationStats,
};
pub use event_log::{
    ApplicationInfo, EventLogAggregator, EventLogSummary, JobRecord, JobStatus, ParsedEventLog,
    StageRecord,
};
pub use history::{DurationPoint, NotableRun, NotableRuns, RunHistoryAnalyzer, RunHistoryReport};
pub use job::{JobDefinitionProcessor, JobDetails};
pub use metrics::{AggregateMetrics, MetricField, StageMetrics};
pub use run::{ClusterInfo, RunDetailProcessor, RunOutputSummary, RunSummary};
pub use thresholds::Thresholds;
