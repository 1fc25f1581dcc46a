//! # pipetimer
//!
//! Efficiency reports for Spark jobs running on Databricks.
//!
//! This crate turns data that has already been fetched from a workspace into
//! structured, serializable reports. It never talks to the network itself:
//! callers hand it event-log lines, run listings, run descriptions or job
//! definitions, and get report structs back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            pipetimer                             │
//! │  ┌─────────┐    ┌────────────────────┐    ┌──────────┐           │
//! │  │ source  │───▶│ EventLogAggregator │───▶│  report  │──▶ text   │
//! │  │ (lines) │    └────────────────────┘    │          │           │
//! │  └─────────┘    ┌────────────────────┐    │          │──▶ JSON   │
//! │   run lists ───▶│ RunHistoryAnalyzer │───▶│          │  (serde)  │
//! │                 └────────────────────┘    │          │           │
//! │   one run ─────▶│ RunDetailProcessor │───▶│          │           │
//! │                 └────────────────────┘    └──────────┘           │
//! │          every component reports through a Diagnostics           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Event-log sources ([`LogSource`] trait), plain or gzip
//! - **[`data`]**: The analysis components and their report types
//! - **[`diagnostics`]**: The logging collaborator handed to each component
//! - **[`config`]**: Settings from defaults, a file and `PIPETIMER_*` variables
//! - **[`report`]**: Plain-text rendering
//!
//! ## Usage
//!
//! ### Aggregating an event log
//!
//! ```no_run
//! use pipetimer::{EventLogAggregator, TracingDiagnostics};
//!
//! let aggregator = EventLogAggregator::new(TracingDiagnostics::boxed("event_log"));
//! let parsed = aggregator.parse_file("eventlogs/app-20240101.gz")?;
//! println!("{}", pipetimer::report::render_event_log(&parsed.summary()));
//! # Ok::<(), pipetimer::AnalysisError>(())
//! ```
//!
//! ### Analyzing run history
//!
//! ```
//! use pipetimer::{RunHistoryAnalyzer, RunRecord, Thresholds, TracingDiagnostics};
//!
//! let analyzer = RunHistoryAnalyzer::new(TracingDiagnostics::boxed("history"), Thresholds::default());
//! let records = vec![
//!     RunRecord::new(1, 1_700_000_000_000, 120_000, "SUCCESS"),
//!     RunRecord::new(2, 1_700_000_600_000, 90_000, "FAILED"),
//! ];
//!
//! let report = analyzer.analyze(&records).unwrap();
//! assert_eq!(report.success_rate_percent, "50.00%");
//! assert!(analyzer.analyze(&[]).is_none());
//! ```

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod report;
pub mod source;

pub use crate::config::Settings;
pub use data::{
    format_duration, format_duration_ms, format_timestamp, EventLogAggregator, EventLogSummary,
    JobDefinitionProcessor, JobDetails, ParsedEventLog, RunDetailProcessor, RunHistoryAnalyzer,
    RunHistoryReport, RunSummary, Thresholds,
};
pub use diagnostics::{CollectingDiagnostics, Diagnostics, Severity, TracingDiagnostics};
pub use error::{AnalysisError, Result};
pub use source::{BytesSource, FileSource, LogSource};

pub use pipetimer_types::{LogEvent, RawJob, RawRun, RawRunOutput, RunListPage, RunRecord};
