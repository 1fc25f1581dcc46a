//! # pipetimer-types
//!
//! Input schemas for pipetimer. This crate defines the shapes that
//! already-fetched data arrives in: Spark listener events read from an
//! execution event log, and run/job descriptions returned by the Databricks
//! jobs API.
//!
//! ## Design Goals
//!
//! - **Explicit variants**: every recognized event kind is its own struct, so
//!   required and optional fields are checked at deserialization time
//! - **Tolerant decoding**: unknown event kinds decode to [`LogEvent::Other`]
//!   and unknown fields are ignored
//! - **No I/O**: types only; reading files and aggregating lives in `pipetimer`
//!
//! ## Example
//!
//! ```rust
//! use pipetimer_types::LogEvent;
//!
//! let line = r#"{"Event":"SparkListenerJobStart","Job ID":1,"Submission Time":1000,"Stage IDs":[1]}"#;
//! let event: LogEvent = serde_json::from_str(line).unwrap();
//!
//! match event {
//!     LogEvent::JobStart(start) => assert_eq!(start.job_id, 1),
//!     other => panic!("unexpected event: {:?}", other),
//! }
//! ```

mod event;
mod job;
mod run;

pub use event::*;
pub use job::*;
pub use run::*;

/// Identifier of a Spark job within one application.
pub type JobId = u64;

/// Identifier of a Spark stage within one application.
pub type StageId = u64;

/// Result state the platform reports for a successful run.
pub const RESULT_SUCCESS: &str = "SUCCESS";

/// Result state used when a run record carries none.
pub const RESULT_UNKNOWN: &str = "UNKNOWN";
