//! Spark listener events as they appear in an execution event log.
//!
//! Each line of an event log is one JSON object whose `"Event"` field names
//! the listener callback that produced it. Only the kinds the aggregator
//! understands get their own variant; everything else is [`LogEvent::Other`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{JobId, StageId};

/// Tag carried by a job-end event when the job succeeded.
pub const JOB_SUCCEEDED: &str = "JobSucceeded";

/// One event from a Spark execution event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Event")]
pub enum LogEvent {
    #[serde(rename = "SparkListenerApplicationStart")]
    ApplicationStart(ApplicationStart),

    #[serde(rename = "SparkListenerApplicationEnd")]
    ApplicationEnd(ApplicationEnd),

    #[serde(rename = "SparkListenerJobStart")]
    JobStart(JobStart),

    #[serde(rename = "SparkListenerJobEnd")]
    JobEnd(JobEnd),

    #[serde(rename = "SparkListenerStageSubmitted")]
    StageSubmitted(StageSubmitted),

    #[serde(rename = "SparkListenerStageCompleted")]
    StageCompleted(StageCompleted),

    /// Any listener event the aggregator does not track (task, executor,
    /// environment, block manager, ...).
    #[serde(other)]
    Other,
}

impl LogEvent {
    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            LogEvent::ApplicationStart(_) => "ApplicationStart",
            LogEvent::ApplicationEnd(_) => "ApplicationEnd",
            LogEvent::JobStart(_) => "JobStart",
            LogEvent::JobEnd(_) => "JobEnd",
            LogEvent::StageSubmitted(_) => "StageSubmitted",
            LogEvent::StageCompleted(_) => "StageCompleted",
            LogEvent::Other => "Other",
        }
    }
}

/// `SparkListenerApplicationStart`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationStart {
    #[serde(rename = "App Name", default)]
    pub app_name: Option<String>,

    #[serde(rename = "App ID", default)]
    pub app_id: Option<String>,

    /// Epoch milliseconds.
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<i64>,

    #[serde(rename = "Spark User", default)]
    pub user: Option<String>,
}

/// `SparkListenerApplicationEnd`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationEnd {
    /// Epoch milliseconds.
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<i64>,
}

/// `SparkListenerJobStart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStart {
    #[serde(rename = "Job ID")]
    pub job_id: JobId,

    #[serde(rename = "Submission Time", default)]
    pub submission_time: Option<i64>,

    /// Stages this job is composed of.
    #[serde(rename = "Stage IDs", default)]
    pub stage_ids: Vec<StageId>,
}

/// `SparkListenerJobEnd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnd {
    #[serde(rename = "Job ID")]
    pub job_id: JobId,

    #[serde(rename = "Completion Time", default)]
    pub completion_time: Option<i64>,

    #[serde(rename = "Job Result", default)]
    pub job_result: Option<JobResult>,
}

impl JobEnd {
    /// The raw result tag, e.g. `"JobSucceeded"` or `"JobFailed"`.
    pub fn result(&self) -> Option<&str> {
        self.job_result.as_ref()?.result.as_deref()
    }
}

/// The `"Job Result"` object of a job-end event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(rename = "Result", default)]
    pub result: Option<String>,
}

/// `SparkListenerStageSubmitted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSubmitted {
    #[serde(rename = "Stage Info")]
    pub stage_info: StageInfo,
}

/// `SparkListenerStageCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCompleted {
    #[serde(rename = "Stage Info")]
    pub stage_info: StageInfo,
}

/// The `"Stage Info"` object shared by stage submitted/completed events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    #[serde(rename = "Stage ID")]
    pub stage_id: StageId,

    #[serde(rename = "Stage Name", alias = "Name", default)]
    pub name: Option<String>,

    /// Declared number of tasks for the stage.
    #[serde(rename = "Number of Tasks", default)]
    pub num_tasks: Option<u64>,

    #[serde(rename = "Details", default)]
    pub details: Option<String>,

    #[serde(rename = "Submission Time", default)]
    pub submission_time: Option<i64>,

    #[serde(rename = "Completion Time", default)]
    pub completion_time: Option<i64>,

    #[serde(rename = "Stage Status", default)]
    pub status: Option<String>,

    #[serde(rename = "Failure Reason", default)]
    pub failure_reason: Option<String>,

    /// Direct per-stage metrics block written by newer Spark versions.
    #[serde(rename = "Task Metrics", default)]
    pub task_metrics: Option<TaskMetrics>,

    /// Flat list of named accumulators, used when `task_metrics` is absent.
    #[serde(rename = "Accumulables", default)]
    pub accumulables: Vec<Accumulable>,
}

/// Aggregated task metrics reported for a stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskMetrics {
    #[serde(rename = "Shuffle Read Metrics", default)]
    pub shuffle_read: Option<ShuffleReadMetrics>,

    #[serde(rename = "Shuffle Write Metrics", default)]
    pub shuffle_write: Option<ShuffleWriteMetrics>,

    #[serde(rename = "Input Metrics", default)]
    pub input: Option<InputMetrics>,

    #[serde(rename = "Output Metrics", default)]
    pub output: Option<OutputMetrics>,
}

impl TaskMetrics {
    /// True when none of the recognized sub-blocks are present.
    pub fn is_empty(&self) -> bool {
        self.shuffle_read.is_none()
            && self.shuffle_write.is_none()
            && self.input.is_none()
            && self.output.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShuffleReadMetrics {
    #[serde(rename = "Remote Bytes Read", default, deserialize_with = "lenient_byte_count")]
    pub remote_bytes_read: u64,

    #[serde(rename = "Local Bytes Read", default, deserialize_with = "lenient_byte_count")]
    pub local_bytes_read: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShuffleWriteMetrics {
    #[serde(rename = "Shuffle Bytes Written", default, deserialize_with = "lenient_byte_count")]
    pub bytes_written: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputMetrics {
    #[serde(rename = "Bytes Read", default, deserialize_with = "lenient_byte_count")]
    pub bytes_read: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputMetrics {
    #[serde(rename = "Bytes Written", default, deserialize_with = "lenient_byte_count")]
    pub bytes_written: u64,
}

/// Reduce a JSON value to a byte count.
///
/// Integers are taken as-is and non-negative finite floats are truncated.
/// Negative numbers, strings and everything else yield `None`: byte counters
/// cannot go below zero.
pub fn byte_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))
}

/// Task-metric counters are read through [`byte_count`]; anything it rejects
/// counts as 0 instead of failing the whole event.
fn lenient_byte_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(byte_count).unwrap_or(0))
}

/// A named accumulator attached to a stage.
///
/// Values are kept as raw JSON: Spark writes numbers for metric
/// accumulators but strings or objects for user-defined ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Accumulable {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,

    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

impl Accumulable {
    /// The value as a byte count; see [`byte_count`] for what is accepted.
    pub fn numeric_value(&self) -> Option<u64> {
        self.value.as_ref().and_then(byte_count)
    }
}
