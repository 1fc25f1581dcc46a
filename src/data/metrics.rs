//! Resource counters collected from completed stages.
//!
//! A completed stage reports its byte counters either as a structured
//! `"Task Metrics"` block or, in older logs, as a flat list of named
//! accumulators. Both shapes reduce to a [`StageMetrics`], which is then
//! folded into the pass-wide [`AggregateMetrics`].

use pipetimer_types::{Accumulable, StageInfo, TaskMetrics};
use serde::Serialize;

/// Counter a stage metric contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    ShuffleRead,
    ShuffleWrite,
    Input,
    Output,
}

/// Accumulator name to the counter it feeds. Remote and local shuffle reads
/// both land in the shuffle-read total.
pub const ACCUMULATORS: &[(&str, MetricField)] = &[
    (
        "internal.metrics.shuffle.read.remoteBytesRead",
        MetricField::ShuffleRead,
    ),
    (
        "internal.metrics.shuffle.read.localBytesRead",
        MetricField::ShuffleRead,
    ),
    (
        "internal.metrics.shuffle.write.bytesWritten",
        MetricField::ShuffleWrite,
    ),
    ("internal.metrics.input.bytesRead", MetricField::Input),
    ("internal.metrics.output.bytesWritten", MetricField::Output),
];

/// Look up the counter fed by an accumulator name.
pub fn accumulator_field(name: &str) -> Option<MetricField> {
    ACCUMULATORS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, field)| *field)
}

/// Byte counters for one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageMetrics {
    pub shuffle_read_bytes: u64,
    pub shuffle_write_bytes: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl StageMetrics {
    /// Extract counters from a completed stage.
    ///
    /// A `"Task Metrics"` block with at least one of the four known
    /// sub-blocks wins, and its missing sub-blocks contribute 0. A block that
    /// is absent, empty, or made only of unrecognized keys (such as
    /// `"Executor Run Time"`) is treated as missing, and the accumulators are
    /// scanned instead.
    pub fn from_stage_info(info: &StageInfo) -> Self {
        match &info.task_metrics {
            Some(block) if !block.is_empty() => Self::from_task_metrics(block),
            _ => Self::from_accumulables(&info.accumulables),
        }
    }

    pub fn from_task_metrics(block: &TaskMetrics) -> Self {
        let shuffle_read_bytes = block
            .shuffle_read
            .as_ref()
            .map(|m| m.remote_bytes_read.saturating_add(m.local_bytes_read))
            .unwrap_or(0);

        Self {
            shuffle_read_bytes,
            shuffle_write_bytes: block.shuffle_write.as_ref().map_or(0, |m| m.bytes_written),
            input_bytes: block.input.as_ref().map_or(0, |m| m.bytes_read),
            output_bytes: block.output.as_ref().map_or(0, |m| m.bytes_written),
        }
    }

    /// Sum recognized accumulators. Unknown names and non-numeric values are
    /// ignored.
    pub fn from_accumulables(accumulables: &[Accumulable]) -> Self {
        let mut metrics = Self::default();
        for acc in accumulables {
            let Some(field) = acc.name.as_deref().and_then(accumulator_field) else {
                continue;
            };
            if let Some(value) = acc.numeric_value() {
                metrics.add(field, value);
            }
        }
        metrics
    }

    pub fn add(&mut self, field: MetricField, value: u64) {
        let slot = match field {
            MetricField::ShuffleRead => &mut self.shuffle_read_bytes,
            MetricField::ShuffleWrite => &mut self.shuffle_write_bytes,
            MetricField::Input => &mut self.input_bytes,
            MetricField::Output => &mut self.output_bytes,
        };
        *slot = slot.saturating_add(value);
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Running counters for one aggregation pass. Never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateMetrics {
    pub total_jobs: u64,
    pub succeeded_jobs: u64,
    pub failed_jobs: u64,
    /// Stage-submitted events seen, retries included.
    pub total_stages: u64,
    /// Sum of declared task counts at submission.
    pub total_tasks: u64,
    pub shuffle_read_bytes: u64,
    pub shuffle_write_bytes: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Lines that were not valid events.
    pub skipped_lines: u64,
    /// Derived durations that came out negative.
    pub negative_durations: u64,
}

impl AggregateMetrics {
    /// Fold one stage's counters into the totals.
    pub fn merge_stage(&mut self, stage: &StageMetrics) {
        self.shuffle_read_bytes = self.shuffle_read_bytes.saturating_add(stage.shuffle_read_bytes);
        self.shuffle_write_bytes = self
            .shuffle_write_bytes
            .saturating_add(stage.shuffle_write_bytes);
        self.input_bytes = self.input_bytes.saturating_add(stage.input_bytes);
        self.output_bytes = self.output_bytes.saturating_add(stage.output_bytes);
    }
}
